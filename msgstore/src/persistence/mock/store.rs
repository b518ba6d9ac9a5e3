use std::{collections::BTreeMap, sync::Arc};

use async_stream::stream;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    codec::{MessageCodec, ProstCodec},
    constants::DEFAULT_REGION,
    key::{canonical_key, StoreKey},
    mock::MockStoreError,
    persistence::{GroupStream, MessageGroupStore, MessageStore},
    util::now_millis,
    Message, MessageGroup,
};

#[derive(Debug)]
struct GroupRow {
    group_key: String,
    message_id: String,
    region: String,
    created_date: i64,
    marked: bool,
    bytes: Vec<u8>,
}

#[derive(Debug, Default)]
struct Tables {
    /// (region, message id) -> encoded message
    messages: BTreeMap<(String, String), Vec<u8>>,
    /// Group members in insertion order.
    groups: Vec<GroupRow>,
}

/// An in-memory store with the same contract as the sqlite one. Don't use
/// this for any real-life purpose, as it has no functionality to clear up
/// its memory usage.
///
/// Messages go through the codec on the way in and out, so callers only
/// ever see copies.
#[derive(Clone)]
pub struct MockMessageStore {
    tables: Arc<Mutex<Tables>>,
    region: Arc<str>,
    codec: Arc<dyn MessageCodec>,
}

impl Default for MockMessageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMessageStore {
    pub fn new() -> Self {
        Self {
            tables: Default::default(),
            region: DEFAULT_REGION.into(),
            codec: Arc::new(ProstCodec::new()),
        }
    }

    /// A store over the same tables, scoped to another region.
    pub fn with_region(&self, region: impl Into<String>) -> Self {
        Self {
            tables: Arc::clone(&self.tables),
            region: region.into().into(),
            codec: Arc::clone(&self.codec),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    fn load_group(&self, tables: &Tables, group_id: Uuid) -> Result<MessageGroup, MockStoreError> {
        let key = canonical_key(&group_id);
        let mut members = tables
            .groups
            .iter()
            .filter(|row| row.group_key == key && row.region == *self.region)
            .collect::<Vec<_>>();
        let Some(timestamp) = members.iter().map(|row| row.created_date).min() else {
            return Ok(MessageGroup::empty(group_id));
        };
        // stable, so insertion order breaks ties
        members.sort_by_key(|row| row.created_date);
        let mut unmarked = Vec::new();
        let mut marked = Vec::new();
        for row in members {
            let message = self.codec.decode(&row.bytes)?;
            if row.marked {
                marked.push(message);
            } else {
                unmarked.push(message);
            }
        }
        Ok(MessageGroup::new(group_id, unmarked, marked, timestamp))
    }

    /// Mark matching unmarked rows.
    fn mark(&self, tables: &mut Tables, key: &str, message_id: Option<&str>) {
        for row in tables.groups.iter_mut().filter(|row| {
            !row.marked
                && row.group_key == key
                && row.region == *self.region
                && message_id.map_or(true, |id| row.message_id == id)
        }) {
            row.marked = true;
        }
    }
}

#[async_trait::async_trait]
impl MessageStore for MockMessageStore {
    type Error = MockStoreError;

    async fn add_message(&self, message: Message) -> Result<Message, Self::Error> {
        let mut lock = self.tables.lock().await;
        let row_key = (self.region.to_string(), canonical_key(&message.id()));
        if message.is_saved() && message.created_date().is_some() {
            if let Some(bytes) = lock.messages.get(&row_key) {
                if self.codec.decode(bytes)? == message {
                    return Ok(message);
                }
            }
        }
        if lock.messages.contains_key(&row_key) {
            return Err(MockStoreError::RowExists(row_key.1));
        }
        let message = message.mark_saved(now_millis());
        let bytes = self.codec.encode(&message)?;
        lock.messages.insert(row_key, bytes);
        Ok(message)
    }

    async fn get_message(&self, id: Uuid) -> Result<Option<Message>, Self::Error> {
        let lock = self.tables.lock().await;
        let row_key = (self.region.to_string(), canonical_key(&id));
        Ok(lock
            .messages
            .get(&row_key)
            .map(|bytes| self.codec.decode(bytes))
            .transpose()?)
    }

    async fn remove_message(&self, id: Uuid) -> Result<Option<Message>, Self::Error> {
        let mut lock = self.tables.lock().await;
        let row_key = (self.region.to_string(), canonical_key(&id));
        Ok(lock
            .messages
            .remove(&row_key)
            .map(|bytes| self.codec.decode(&bytes))
            .transpose()?)
    }

    async fn message_count(&self) -> Result<u64, Self::Error> {
        let lock = self.tables.lock().await;
        Ok(lock
            .messages
            .keys()
            .filter(|(region, _)| region.as_str() == &*self.region)
            .count() as u64)
    }
}

#[async_trait::async_trait]
impl MessageGroupStore for MockMessageStore {
    type Error = MockStoreError;

    async fn add_message_to_group<K>(
        &self,
        group_key: &K,
        message: &Message,
    ) -> Result<MessageGroup, Self::Error>
    where
        K: StoreKey + Sync + ?Sized,
    {
        let group_id = group_key.to_store_uuid();
        let key = canonical_key(&group_id);
        let message_id = canonical_key(&message.id());
        let mut lock = self.tables.lock().await;
        if lock.groups.iter().any(|row| {
            row.group_key == key && row.message_id == message_id && row.region == *self.region
        }) {
            return Err(MockStoreError::RowExists(message_id));
        }
        let bytes = self.codec.encode(message)?;
        lock.groups.push(GroupRow {
            group_key: key,
            message_id,
            region: self.region.to_string(),
            created_date: now_millis(),
            marked: false,
            bytes,
        });
        self.load_group(&lock, group_id)
    }

    async fn get_message_group<K>(&self, group_key: &K) -> Result<MessageGroup, Self::Error>
    where
        K: StoreKey + Sync + ?Sized,
    {
        let lock = self.tables.lock().await;
        self.load_group(&lock, group_key.to_store_uuid())
    }

    async fn mark_message_group(&self, group: &MessageGroup) -> Result<MessageGroup, Self::Error> {
        let mut lock = self.tables.lock().await;
        self.mark(&mut lock, &canonical_key(&group.group_id()), None);
        self.load_group(&lock, group.group_id())
    }

    async fn mark_message_from_group<K>(
        &self,
        group_key: &K,
        message: &Message,
    ) -> Result<MessageGroup, Self::Error>
    where
        K: StoreKey + Sync + ?Sized,
    {
        let group_id = group_key.to_store_uuid();
        let message_id = canonical_key(&message.id());
        let mut lock = self.tables.lock().await;
        self.mark(&mut lock, &canonical_key(&group_id), Some(&message_id));
        self.load_group(&lock, group_id)
    }

    async fn remove_message_from_group<K>(
        &self,
        group_key: &K,
        message: &Message,
    ) -> Result<MessageGroup, Self::Error>
    where
        K: StoreKey + Sync + ?Sized,
    {
        let group_id = group_key.to_store_uuid();
        let key = canonical_key(&group_id);
        let message_id = canonical_key(&message.id());
        let mut lock = self.tables.lock().await;
        lock.groups.retain(|row| {
            !(row.group_key == key && row.message_id == message_id && row.region == *self.region)
        });
        self.load_group(&lock, group_id)
    }

    async fn remove_message_group<K>(&self, group_key: &K) -> Result<(), Self::Error>
    where
        K: StoreKey + Sync + ?Sized,
    {
        let key = canonical_key(group_key);
        let mut lock = self.tables.lock().await;
        lock.groups
            .retain(|row| !(row.group_key == key && row.region == *self.region));
        Ok(())
    }

    async fn iterate_groups(&self) -> Result<GroupStream<Self::Error>, Self::Error> {
        let keys = {
            let lock = self.tables.lock().await;
            let mut keys = lock
                .groups
                .iter()
                .filter(|row| row.region == *self.region)
                .map(|row| row.group_key.clone())
                .collect::<Vec<_>>();
            keys.sort();
            keys.dedup();
            keys
        };

        let store = self.clone();
        Ok(Box::pin(stream! {
            for key in keys {
                yield store.get_message_group(key.as_str()).await;
            }
        }))
    }

    async fn message_group_count(&self) -> Result<u64, Self::Error> {
        let lock = self.tables.lock().await;
        let mut keys = lock
            .groups
            .iter()
            .filter(|row| row.region == *self.region)
            .map(|row| row.group_key.as_str())
            .collect::<Vec<_>>();
        keys.sort_unstable();
        keys.dedup();
        Ok(keys.len() as u64)
    }
}
