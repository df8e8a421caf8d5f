//! Named binary tag (NBT) codec.
//!
//! Avatar files are a single named root compound, either raw or gzip
//! compressed (`.moon`). Everything is big-endian.

mod error;
mod io;
mod tag;

pub use error::NbtError;
pub use io::{read, read_compressed, read_named, write, write_compressed, write_named};
pub use tag::{Compound, List, Tag, TagType};

/// Maximum compound/list nesting accepted by the reader.
pub const MAX_DEPTH: usize = 512;
