//! Storage of individual messages by id.

use std::error::Error;

use async_trait::async_trait;
use uuid::Uuid;

use crate::Message;

/// Point storage of immutable messages, scoped to the store's region.
#[async_trait]
pub trait MessageStore: Send + Sync + 'static {
    /// An error occurring from an operation.
    type Error: Error + Send + Sync + 'static;

    /// Save a message and return the stamped copy which was written.
    ///
    /// Messages already flagged as saved are not written twice: if a row with
    /// the same id decodes to an equal message, the message is returned
    /// untouched. Otherwise the message is stamped with the
    /// [SAVED_KEY](crate::SAVED_KEY) and [CREATED_DATE_KEY](crate::CREATED_DATE_KEY)
    /// headers and inserted. There is no update path.
    async fn add_message(&self, message: Message) -> Result<Message, Self::Error>;

    /// Look a message up by id. `None` signifies nothing stored.
    async fn get_message(&self, id: Uuid) -> Result<Option<Message>, Self::Error>;

    /// Delete a message, returning what was deleted.
    ///
    /// Returns `None` when nothing was stored, and also when a concurrent
    /// remover deleted the row between the read and the delete.
    async fn remove_message(&self, id: Uuid) -> Result<Option<Message>, Self::Error>;

    /// Number of individual messages stored in this region.
    async fn message_count(&self) -> Result<u64, Self::Error>;
}
