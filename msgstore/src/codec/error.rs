use thiserror::Error;

/// Stored bytes could not be reconstituted in to a message.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("truncated message: expected {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },
    #[error("trailing bytes: expected {expected} bytes, found {found}")]
    TrailingBytes { expected: usize, found: usize },
    #[error("unsupported format version: found {0}")]
    UnsupportedVersion(u8),
    #[error("malformed envelope")]
    Malformed(#[from] prost::DecodeError),
    #[error("invalid message id")]
    InvalidId(#[from] uuid::Error),
}

/// A message could not be turned in to bytes.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("message too large: {len} bytes, at most {max} allowed")]
    TooLarge { len: usize, max: usize },
}
