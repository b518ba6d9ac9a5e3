//! Messages are stored as opaque blobs. A [MessageCodec] turns a [Message]
//! in to bytes and back; stores assume nothing about the layout other than
//! that a decoded message equals the one that was encoded.
//!
//! The default, [ProstCodec], borrows the framing the network codecs in
//! this family use: every blob starts with a header made of a format
//! version (always [FORMAT_VERSION](crate::constants::FORMAT_VERSION) for
//! now) and a body size (n). The next n bytes deserialize in to an
//! [Envelope](crate::proto::envelope::Envelope).

mod error;
mod prost_codec;

pub use error::{DecodeError, EncodeError};
pub use prost_codec::ProstCodec;

use crate::Message;

/// A strategy for serializing messages to storage.
pub trait MessageCodec: Send + Sync + 'static {
    /// Serialize a message. Fails rather than writing bytes which
    /// [decode](Self::decode) could not read back.
    fn encode(&self, message: &Message) -> Result<Vec<u8>, EncodeError>;

    /// Reconstitute a message from bytes produced by [encode](Self::encode).
    /// Anything else must fail rather than produce a corrupted message.
    fn decode(&self, bytes: &[u8]) -> Result<Message, DecodeError>;
}
