//! Groups of messages sharing a correlation key.
//!
//! A group exists only through its members: the first
//! [add_message_to_group](MessageGroupStore::add_message_to_group) creates
//! it and removing the last member destroys it. Every mutation which returns
//! a group reloads it from the backend, so the caller sees what is actually
//! stored (including effects of concurrent writers) rather than a local
//! projection.
//!
//! ## Consistency
//!
//! Each write is a single statement. Loading a group however takes up to
//! three reads (marked members, unmarked members, oldest timestamp) which
//! are not isolated from concurrent writers: a load racing an add or a mark
//! may miss a member, or compute a timestamp before that member landed.
//! Callers needing snapshot semantics must serialize access to a group
//! themselves (e.g. one writer per group).

use std::{error::Error, pin::Pin, time::Duration};

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tracing::debug;

use crate::{
    key::StoreKey,
    util::{expiry_cutoff, now_millis},
    Message, MessageGroup,
};

/// A one-shot, forward-only sequence of groups. The set of keys is fixed
/// when the stream is created; each group's content is loaded when polled.
pub type GroupStream<E> = Pin<Box<dyn Stream<Item = Result<MessageGroup, E>> + Send>>;

/// Membership of messages in groups, scoped to the store's region.
#[async_trait]
pub trait MessageGroupStore: Send + Sync + 'static {
    /// An error occurring from an operation.
    type Error: Error + Send + Sync + 'static;

    /// Add an unmarked member to a group, creating the group if needed.
    /// Adding the same message twice is not guarded against here.
    async fn add_message_to_group<K>(
        &self,
        group_key: &K,
        message: &Message,
    ) -> Result<MessageGroup, Self::Error>
    where
        K: StoreKey + Sync + ?Sized;

    /// Load a group. Unknown keys yield [MessageGroup::empty].
    async fn get_message_group<K>(&self, group_key: &K) -> Result<MessageGroup, Self::Error>
    where
        K: StoreKey + Sync + ?Sized;

    /// Mark every unmarked member of the group. Already marked members are
    /// left alone, so marking twice is harmless.
    async fn mark_message_group(&self, group: &MessageGroup) -> Result<MessageGroup, Self::Error>;

    /// Mark a single member. A no-op if it is already marked.
    async fn mark_message_from_group<K>(
        &self,
        group_key: &K,
        message: &Message,
    ) -> Result<MessageGroup, Self::Error>
    where
        K: StoreKey + Sync + ?Sized;

    /// Remove a single member, marked or not.
    async fn remove_message_from_group<K>(
        &self,
        group_key: &K,
        message: &Message,
    ) -> Result<MessageGroup, Self::Error>
    where
        K: StoreKey + Sync + ?Sized;

    /// Remove every member of a group.
    async fn remove_message_group<K>(&self, group_key: &K) -> Result<(), Self::Error>
    where
        K: StoreKey + Sync + ?Sized;

    /// Snapshot the keys of all groups with at least one member, and lazily
    /// load each of them. Groups may have changed, or be empty, by the time
    /// they are yielded.
    async fn iterate_groups(&self) -> Result<GroupStream<Self::Error>, Self::Error>;

    /// Number of groups with at least one member.
    async fn message_group_count(&self) -> Result<u64, Self::Error>;

    /// Remove every group whose oldest member is older than `timeout`, and
    /// return the groups as they were just before removal.
    async fn expire_message_groups(
        &self,
        timeout: Duration,
    ) -> Result<Vec<MessageGroup>, Self::Error> {
        let cutoff = expiry_cutoff(now_millis(), timeout);
        let mut groups = self.iterate_groups().await?;
        let mut expired = Vec::new();
        while let Some(group) = groups.next().await {
            let group = group?;
            match group.timestamp() {
                Some(timestamp) if timestamp < cutoff => {
                    debug!("Expiring group {} created at {}", group.group_id(), timestamp);
                    self.remove_message_group(&group.group_id()).await?;
                    expired.push(group);
                }
                _ => {}
            }
        }
        Ok(expired)
    }
}
