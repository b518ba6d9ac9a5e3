use std::mem::size_of;

/// Header size in contiguous bytes.
pub const HEADER_SIZE: usize =
    // format version
    size_of::<u8>() +
        // body length
        size_of::<u32>();

/// Version byte written by [ProstCodec](crate::codec::ProstCodec). Bump it
/// whenever the envelope layout changes incompatibly.
pub const FORMAT_VERSION: u8 = 1;

/// Largest envelope body the header's length field can describe.
pub const MAX_ENVELOPE_SIZE: usize = u32::MAX as usize;

/// Region used when none is configured.
pub const DEFAULT_REGION: &str = "DEFAULT";

/// Prepended to every table name when none is configured.
pub const DEFAULT_TABLE_PREFIX: &str = "INT_";

/// Header flagging that a message has already been saved by a store.
pub const SAVED_KEY: &str = "MessageStore.SAVED";

/// Header carrying the epoch milliseconds at which a message was saved.
pub const CREATED_DATE_KEY: &str = "MessageStore.CREATED_DATE";
