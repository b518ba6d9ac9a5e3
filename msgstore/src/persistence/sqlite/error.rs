use thiserror::Error;

use crate::codec::{DecodeError, EncodeError};

/// Failure of a [SqliteMessageStore](super::SqliteMessageStore) operation.
/// Backend errors are passed through untouched; nothing is retried.
#[derive(Debug, Error)]
pub enum SqlError {
    #[error("sqlx error")]
    Sql(#[from] sqlx::Error),
    #[error("failed to encode message")]
    Encode(#[from] EncodeError),
    #[error("failed to decode stored message")]
    Decode(#[from] DecodeError),
    /// Stored rows contradict each other. Not expected outside of a bug or
    /// a schema being modified underneath the store.
    #[error("could not locate created date for group {group_key}")]
    Consistency { group_key: String },
    /// The store was configured incorrectly.
    #[error("invalid configuration: {0}")]
    Precondition(&'static str),
}
