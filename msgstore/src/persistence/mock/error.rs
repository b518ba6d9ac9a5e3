use thiserror::Error;

use crate::codec::{DecodeError, EncodeError};

#[derive(Debug, Error)]
pub enum MockStoreError {
    #[error("row {0} already exists")]
    RowExists(String),
    #[error("failed to encode message")]
    Encode(#[from] EncodeError),
    #[error("failed to decode stored message")]
    Decode(#[from] DecodeError),
}
