use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::{
    constants::{CREATED_DATE_KEY, SAVED_KEY},
    util::now_millis,
};

/// An immutable envelope: identity, creation time, string headers and an
/// opaque payload.
///
/// Builder methods consume `self` and return a new value, so a [Message]
/// handed to a store is never changed behind the caller's back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: Uuid,
    /// Creation timestamp in epoch milli-seconds.
    timestamp: i64,
    headers: BTreeMap<String, String>,
    payload: Vec<u8>,
}

impl Message {
    /// Create a new message with a random id, stamped with the current time.
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self::from_parts(Uuid::new_v4(), now_millis(), BTreeMap::new(), payload.into())
    }

    /// Reassemble a message from its stored parts.
    pub fn from_parts(
        id: Uuid,
        timestamp: i64,
        headers: BTreeMap<String, String>,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            id,
            timestamp,
            headers,
            payload,
        }
    }

    /// Add (or replace) a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// The creation time as a [DateTime], if it is representable.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Whether a store has already saved this message.
    pub fn is_saved(&self) -> bool {
        self.header(SAVED_KEY) == Some("true")
    }

    /// Epoch milli-seconds at which a store saved this message.
    pub fn created_date(&self) -> Option<i64> {
        self.header(CREATED_DATE_KEY).and_then(|v| v.parse().ok())
    }

    /// Stamp the store's bookkeeping headers.
    pub(crate) fn mark_saved(self, created_date: i64) -> Self {
        self.with_header(SAVED_KEY, "true")
            .with_header(CREATED_DATE_KEY, created_date.to_string())
    }
}

/// A snapshot of a message group as seen by the backend when it was loaded.
///
/// A group with no members is never persisted; it is represented by
/// [MessageGroup::empty], which has no timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageGroup {
    group_id: Uuid,
    /// Not yet processed, oldest first.
    unmarked: Vec<Message>,
    /// Processed, in no particular order.
    marked: Vec<Message>,
    /// Creation time of the oldest member.
    timestamp: Option<i64>,
}

impl MessageGroup {
    pub fn new(group_id: Uuid, unmarked: Vec<Message>, marked: Vec<Message>, timestamp: i64) -> Self {
        Self {
            group_id,
            unmarked,
            marked,
            timestamp: Some(timestamp),
        }
    }

    /// The representation of a group without members.
    pub fn empty(group_id: Uuid) -> Self {
        Self {
            group_id,
            unmarked: Vec::new(),
            marked: Vec::new(),
            timestamp: None,
        }
    }

    pub fn group_id(&self) -> Uuid {
        self.group_id
    }

    pub fn unmarked(&self) -> &[Message] {
        &self.unmarked
    }

    pub fn marked(&self) -> &[Message] {
        &self.marked
    }

    pub fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    /// Total number of members, marked or not.
    pub fn size(&self) -> usize {
        self.unmarked.len() + self.marked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Whether a message with this id is a member, marked or not.
    pub fn contains(&self, id: Uuid) -> bool {
        self.unmarked
            .iter()
            .chain(self.marked.iter())
            .any(|m| m.id() == id)
    }

    /// Take the unmarked and marked members, in that order.
    pub fn into_parts(self) -> (Vec<Message>, Vec<Message>) {
        (self.unmarked, self.marked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saved_headers() {
        let message = Message::new(b"hello".to_vec());
        assert!(!message.is_saved());
        assert_eq!(message.created_date(), None);

        let saved = message.clone().mark_saved(1234);
        assert!(saved.is_saved());
        assert_eq!(saved.created_date(), Some(1234));
        assert_eq!(saved.id(), message.id());
        assert_eq!(saved.timestamp(), message.timestamp());
        assert_ne!(saved, message);
    }

    #[test]
    fn with_header_replaces() {
        let message = Message::new(vec![])
            .with_header("a", "1")
            .with_header("a", "2");
        assert_eq!(message.header("a"), Some("2"));
        assert_eq!(message.headers().len(), 1);
    }

    #[test]
    fn empty_group() {
        let id = Uuid::new_v4();
        let group = MessageGroup::empty(id);
        assert!(group.is_empty());
        assert_eq!(group.size(), 0);
        assert_eq!(group.timestamp(), None);
        assert_eq!(group.group_id(), id);
    }

    #[test]
    fn group_membership() {
        let m1 = Message::new(b"1".to_vec());
        let m2 = Message::new(b"2".to_vec());
        let group = MessageGroup::new(Uuid::new_v4(), vec![m1.clone()], vec![m2.clone()], 10);
        assert_eq!(group.size(), 2);
        assert!(group.contains(m1.id()));
        assert!(group.contains(m2.id()));
        assert!(!group.contains(Uuid::new_v4()));
        assert_eq!(group.timestamp(), Some(10));

        let (unmarked, marked) = group.into_parts();
        assert_eq!(unmarked, vec![m1]);
        assert_eq!(marked, vec![m2]);
    }
}
