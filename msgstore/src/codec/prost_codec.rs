use bytes::{Buf, BufMut, BytesMut};
use prost::Message as _;
use uuid::Uuid;

use super::{DecodeError, EncodeError, MessageCodec};
use crate::{
    constants::{FORMAT_VERSION, HEADER_SIZE, MAX_ENVELOPE_SIZE},
    proto::envelope::Envelope,
    Message,
};

/// Protobuf backed [MessageCodec]. This is the default for every store.
#[derive(Debug, Clone, Copy)]
pub struct ProstCodec {
    max_size: usize,
}

impl Default for ProstCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl ProstCodec {
    /// Accepts any envelope the header can describe, see
    /// [MAX_ENVELOPE_SIZE].
    pub fn new() -> Self {
        Self {
            max_size: MAX_ENVELOPE_SIZE,
        }
    }

    /// Reject envelopes over `max_size` bytes. Capped at
    /// [MAX_ENVELOPE_SIZE].
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            max_size: max_size.min(MAX_ENVELOPE_SIZE),
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    fn to_envelope(message: &Message) -> Envelope {
        Envelope {
            id: message.id().hyphenated().to_string(),
            timestamp: message.timestamp(),
            headers: message.headers().clone(),
            payload: message.payload().to_vec(),
        }
    }

    fn from_envelope(envelope: Envelope) -> Result<Message, DecodeError> {
        let id = Uuid::parse_str(&envelope.id)?;
        Ok(Message::from_parts(
            id,
            envelope.timestamp,
            envelope.headers,
            envelope.payload,
        ))
    }
}

impl MessageCodec for ProstCodec {
    fn encode(&self, message: &Message) -> Result<Vec<u8>, EncodeError> {
        let envelope = Self::to_envelope(message);
        let len = envelope.encoded_len();
        if len > self.max_size {
            return Err(EncodeError::TooLarge {
                len,
                max: self.max_size,
            });
        }
        let mut dst = BytesMut::with_capacity(HEADER_SIZE + len);
        // now that we know length, we can write the header
        dst.put_u8(FORMAT_VERSION);
        dst.put_u32(len as u32);
        envelope.encode_raw(&mut dst);
        Ok(dst.to_vec())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Message, DecodeError> {
        let mut src = bytes;
        if src.remaining() < HEADER_SIZE {
            return Err(DecodeError::Truncated {
                expected: HEADER_SIZE,
                found: src.remaining(),
            });
        }
        match src.get_u8() {
            FORMAT_VERSION => {}
            v => return Err(DecodeError::UnsupportedVersion(v)),
        };
        let len = src.get_u32() as usize;
        if src.remaining() < len {
            return Err(DecodeError::Truncated {
                expected: HEADER_SIZE + len,
                found: bytes.len(),
            });
        }
        if src.remaining() > len {
            return Err(DecodeError::TrailingBytes {
                expected: HEADER_SIZE + len,
                found: bytes.len(),
            });
        }
        let envelope = Envelope::decode(src)?;
        Self::from_envelope(envelope)
    }
}
