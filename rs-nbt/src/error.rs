use thiserror::Error;

use crate::TagType;

#[derive(Debug, Error)]
pub enum NbtError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown tag id {0}")]
    UnknownTag(u8),

    #[error("Root tag must be a compound, found {0:?}")]
    RootNotCompound(TagType),

    #[error("Negative length {0}")]
    NegativeLength(i32),

    #[error("Nesting deeper than {0} levels")]
    TooDeep(usize),

    #[error("List of {expected:?} cannot hold {found:?}")]
    ListTypeMismatch { expected: TagType, found: TagType },

    #[error("String too long to encode ({0} bytes)")]
    StringTooLong(usize),
}
