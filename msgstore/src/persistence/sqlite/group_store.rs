use async_stream::stream;
use sqlx::Row;
use tracing::{debug, trace, warn};

use super::{error::SqlError, store::SqliteMessageStore};
use crate::{
    key::{canonical_key, StoreKey},
    persistence::{GroupStream, MessageGroupStore},
    util::now_millis,
    Message, MessageGroup,
};

#[async_trait::async_trait]
impl MessageGroupStore for SqliteMessageStore {
    type Error = SqlError;

    async fn add_message_to_group<K>(
        &self,
        group_key: &K,
        message: &Message,
    ) -> Result<MessageGroup, Self::Error>
    where
        K: StoreKey + Sync + ?Sized,
    {
        let created_date = now_millis();
        let message_id = canonical_key(&message.id());
        let key = canonical_key(group_key);
        let bytes = self.codec.encode(message)?;

        debug!(
            "Inserting message with id key={} and created date={} in to group {}",
            message_id, created_date, key
        );
        sqlx::query(&self.queries.add_to_group)
            .bind(&message_id)
            .bind(&*self.region)
            .bind(created_date)
            .bind(&key)
            .bind(bytes)
            .execute(&self.pool)
            .await?;

        self.get_message_group(group_key).await
    }

    async fn get_message_group<K>(&self, group_key: &K) -> Result<MessageGroup, Self::Error>
    where
        K: StoreKey + Sync + ?Sized,
    {
        let group_id = group_key.to_store_uuid();
        let key = canonical_key(&group_id);
        trace!("Loading group {}", key);

        // one connection for the whole read, but no transaction: see the
        // trait documentation
        let mut conn = self.pool.acquire().await?;
        let marked = sqlx::query(&self.queries.list_marked)
            .bind(&key)
            .bind(&*self.region)
            .fetch_all(&mut *conn)
            .await?;
        let unmarked = sqlx::query(&self.queries.list_unmarked)
            .bind(&key)
            .bind(&*self.region)
            .fetch_all(&mut *conn)
            .await?;
        if marked.is_empty() && unmarked.is_empty() {
            return Ok(MessageGroup::empty(group_id));
        }
        let timestamp = sqlx::query(&self.queries.min_created_date)
            .bind(&key)
            .bind(&*self.region)
            .fetch_one(&mut *conn)
            .await?
            .try_get::<Option<i64>, _>("CREATED_DATE")?;
        drop(conn);

        let Some(timestamp) = timestamp else {
            warn!("Could not locate created date for group {}", key);
            return Err(SqlError::Consistency { group_key: key });
        };
        let unmarked = unmarked
            .iter()
            .map(|row| self.decode_row(row))
            .collect::<Result<Vec<_>, _>>()?;
        let marked = marked
            .iter()
            .map(|row| self.decode_row(row))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MessageGroup::new(group_id, unmarked, marked, timestamp))
    }

    async fn mark_message_group(&self, group: &MessageGroup) -> Result<MessageGroup, Self::Error> {
        let updated_date = now_millis();
        let key = canonical_key(&group.group_id());

        debug!("Marking messages with group key={}", key);
        sqlx::query(&self.queries.mark_group)
            .bind(updated_date)
            .bind(&key)
            .bind(&*self.region)
            .execute(&self.pool)
            .await?;

        self.get_message_group(&group.group_id()).await
    }

    async fn mark_message_from_group<K>(
        &self,
        group_key: &K,
        message: &Message,
    ) -> Result<MessageGroup, Self::Error>
    where
        K: StoreKey + Sync + ?Sized,
    {
        let updated_date = now_millis();
        let key = canonical_key(group_key);
        let message_id = canonical_key(&message.id());

        debug!("Marking message {} in group with group key={}", message_id, key);
        let result = sqlx::query(&self.queries.mark_message)
            .bind(updated_date)
            .bind(&message_id)
            .bind(&key)
            .bind(&*self.region)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            trace!("Message {} in group {} was not marked", message_id, key);
        }

        self.get_message_group(group_key).await
    }

    async fn remove_message_from_group<K>(
        &self,
        group_key: &K,
        message: &Message,
    ) -> Result<MessageGroup, Self::Error>
    where
        K: StoreKey + Sync + ?Sized,
    {
        let key = canonical_key(group_key);
        let message_id = canonical_key(&message.id());

        debug!("Removing message {} from group with group key={}", message_id, key);
        sqlx::query(&self.queries.remove_from_group)
            .bind(&key)
            .bind(&*self.region)
            .bind(&message_id)
            .execute(&self.pool)
            .await?;

        self.get_message_group(group_key).await
    }

    async fn remove_message_group<K>(&self, group_key: &K) -> Result<(), Self::Error>
    where
        K: StoreKey + Sync + ?Sized,
    {
        let key = canonical_key(group_key);

        debug!("Removing messages with group key={}", key);
        sqlx::query(&self.queries.delete_group)
            .bind(&key)
            .bind(&*self.region)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn iterate_groups(&self) -> Result<GroupStream<Self::Error>, Self::Error> {
        let keys = sqlx::query(&self.queries.list_group_keys)
            .bind(&*self.region)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(|row| row.try_get::<String, _>("GROUP_KEY"))
            .collect::<Result<Vec<_>, _>>()?;
        trace!("Iterating {} groups in region {}", keys.len(), self.region);

        let store = self.clone();
        Ok(Box::pin(stream! {
            for key in keys {
                yield store.get_message_group(key.as_str()).await;
            }
        }))
    }

    async fn message_group_count(&self) -> Result<u64, Self::Error> {
        let row = sqlx::query(&self.queries.count_groups)
            .bind(&*self.region)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>(0)? as u64)
    }
}
