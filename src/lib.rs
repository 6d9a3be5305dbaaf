//! Reader for Director movie files (`RIFX` big-endian, `XFIR` little-endian).
//!
//! A movie is resolved in three layers: the top-level chunk walk
//! ([`container`]), the resource directory (`mmap`) located through the
//! initial map (`imap`), and the ownership table (`KEY*`) that answers
//! "which resource of type X belongs to resource Y". Every offset recorded
//! in one layer is cross-checked against the others before it is trusted.

pub mod chunk;
pub mod container;
pub mod io;
pub mod movie;

pub use chunk::{
    Chunk, Config, FourCC, InitialMap, KeyEntry, KeyTable, LookupError, Rect, ResourceDescriptor,
    ResourceDirectory, ResourceId,
};
pub use container::{Container, Endianness};
pub use io::chunk::{ReadChunkError, ReadChunks, Record};
pub use io::value::{ReadDirectorValues, ReadValueError};
pub use movie::{DecodeOptions, Movie, ReadMovieError};
