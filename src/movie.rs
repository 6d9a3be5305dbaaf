use byteorder::{BigEndian, LittleEndian};
use crate::chunk::*;
use crate::container::{Container, Endianness};
use crate::io::chunk::*;
use crate::io::value::*;

use std::io::{self, Cursor, Read, Seek};
use thiserror::Error;
use tracing::{debug, trace};

// DecodeOptions

#[derive(Clone, Debug)]
pub struct DecodeOptions {
    /// Reject odd-sized chunks whose pad byte is not zero.
    pub require_zero_padding: bool,
    /// Version tags (e.g. `MV93`) to accept. `None` accepts any.
    pub supported_versions: Option<Vec<FourCC>>,
}

impl Default for DecodeOptions {
    fn default() -> DecodeOptions {
        DecodeOptions {
            require_zero_padding: true,
            supported_versions: None,
        }
    }
}

// Movie

/// A fully resolved movie file.
///
/// Building one walks the container, then follows `imap` → `mmap` → `KEY*`
/// and requires each step's recorded offset to match the chunk the walk
/// found there.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Movie {
    pub container: Container,
    pub initial_map: InitialMap,
    pub resources: ResourceDirectory,
    pub key_table: KeyTable,
    pub config: Config,
}

impl Movie {
    pub fn from_bytes(buf: &[u8]) -> Result<Movie, ReadMovieError> {
        Movie::read(&mut Cursor::new(buf))
    }

    pub fn read<R: Read + Seek>(rdr: &mut R) -> Result<Movie, ReadMovieError> {
        Movie::read_with(rdr, &DecodeOptions::default())
    }

    pub fn read_with<R: Read + Seek>(rdr: &mut R, options: &DecodeOptions) -> Result<Movie, ReadMovieError> {
        let container = Container::read(rdr, options)?;
        match container.endianness {
            Endianness::Big => read_tables::<BigEndian, R>(rdr, container),
            Endianness::Little => read_tables::<LittleEndian, R>(rdr, container),
        }
    }

    /// Finds the chunk of the resource of type `fourcc` owned by `owner`.
    pub fn owned_chunk(&self, owner: ResourceId, fourcc: FourCC) -> Result<Option<(ResourceId, &Chunk)>, ReadMovieError> {
        match self.key_table.lookup(owner, fourcc)? {
            Some(id) => resource_chunk(&self.container, &self.resources, id, fourcc).map(Some),
            None => Ok(None),
        }
    }

    /// Decodes the record of type `T` owned by `owner` from the same file
    /// this movie was read from.
    pub fn read_owned<T: Record, R: Read + Seek>(&self, rdr: &mut R, owner: ResourceId) -> Result<T, ReadMovieError> {
        read_owned(rdr, &self.container, &self.resources, &self.key_table, owner)
    }
}

fn read_tables<B: ByteOrder, R: Read + Seek>(rdr: &mut R, container: Container) -> Result<Movie, ReadMovieError> {
    let imap_chunk = *walked_chunk(&container, 0, "initial map")?;
    let initial_map = rdr.read_imap::<B>(&imap_chunk)?;

    let mmap_chunk = *walked_chunk(&container, 1, "resource directory")?;
    if initial_map.directory_offset != mmap_chunk.offset {
        return Err(ReadMovieError::OffsetMismatch {
            what: "resource directory",
            expected: initial_map.directory_offset,
            actual: mmap_chunk.offset,
        });
    }
    let resources = rdr.read_mmap::<B>(&mmap_chunk)?;
    debug!(offset = mmap_chunk.offset, resources = resources.len(), "read resource directory");

    let key_resource = resources
        .get(ResourceId::KEY_TABLE)
        .ok_or(ReadMovieError::MissingResource(ResourceId::KEY_TABLE))?;
    if key_resource.fourcc != FourCC::KEY_TABLE {
        return Err(ReadMovieError::ResourceMismatch {
            id: ResourceId::KEY_TABLE,
            expected: FourCC::KEY_TABLE,
            found: key_resource.fourcc,
        });
    }
    let key_chunk = *walked_chunk(&container, 2, "ownership table")?;
    if key_resource.offset != key_chunk.offset {
        return Err(ReadMovieError::OffsetMismatch {
            what: "ownership table",
            expected: key_resource.offset,
            actual: key_chunk.offset,
        });
    }
    let key_table = rdr.read_key_table::<B>(&key_chunk)?;
    debug!(offset = key_chunk.offset, keys = key_table.entries.len(), "read ownership table");

    let config = read_owned::<Config, R>(rdr, &container, &resources, &key_table, ResourceId::MOVIE)?;

    Ok(Movie {
        container,
        initial_map,
        resources,
        key_table,
        config,
    })
}

fn walked_chunk<'a>(container: &'a Container, index: usize, what: &'static str) -> Result<&'a Chunk, ReadMovieError> {
    container.chunk(index).ok_or(ReadMovieError::MissingChunk { index, what })
}

fn resource_chunk<'a>(
    container: &'a Container,
    resources: &ResourceDirectory,
    id: ResourceId,
    fourcc: FourCC,
) -> Result<(ResourceId, &'a Chunk), ReadMovieError> {
    let resource = resources.get(id).ok_or(ReadMovieError::MissingResource(id))?;
    if resource.fourcc != fourcc {
        return Err(ReadMovieError::ResourceMismatch { id, expected: fourcc, found: resource.fourcc });
    }
    let (index, chunk) = container
        .chunk_at(resource.offset)
        .ok_or(ReadMovieError::UnmappedOffset { id, offset: resource.offset })?;
    if chunk.fourcc != resource.fourcc {
        return Err(ReadMovieError::ResourceMismatch { id, expected: resource.fourcc, found: chunk.fourcc });
    }
    if chunk.size != resource.size {
        return Err(ReadMovieError::SizeMismatch { id, expected: resource.size, actual: chunk.size });
    }
    trace!(%id, %fourcc, index, offset = chunk.offset, "resolved resource");
    Ok((id, chunk))
}

fn read_owned<T: Record, R: Read + Seek>(
    rdr: &mut R,
    container: &Container,
    resources: &ResourceDirectory,
    key_table: &KeyTable,
    owner: ResourceId,
) -> Result<T, ReadMovieError> {
    for &fourcc in T::FOURCCS {
        if let Some(id) = key_table.lookup(owner, fourcc)? {
            let (_, chunk) = resource_chunk(container, resources, id, fourcc)?;
            debug!(%owner, %fourcc, %id, offset = chunk.offset, "reading owned record");
            return Ok(rdr.read_record::<T>(chunk)?);
        }
    }
    Err(ReadMovieError::MissingRecord { owner, expected: T::FOURCCS.to_vec() })
}

// ReadMovieError

#[derive(Debug, Error)]
pub enum ReadMovieError {
    #[error("invalid header: magic {0} is neither RIFX nor XFIR")]
    InvalidHeader(FourCC),
    #[error("unsupported director version {0}")]
    UnsupportedVersion(FourCC),
    #[error("file is truncated: header declares {expected} bytes, stream has {actual}")]
    Truncated { expected: u64, actual: u64 },
    #[error("{fourcc} chunk at offset {offset} ends at {end}, past the container end {container_end}")]
    ChunkOverrun {
        offset: u64,
        fourcc: FourCC,
        end: u64,
        container_end: u64,
    },
    #[error("declared container size {declared} is below the {minimum} bytes its version tag needs")]
    DeclaredSizeTooSmall { declared: u32, minimum: u32 },
    #[error("{actual} bytes in stream, but the container ends at {end}")]
    TrailingData { end: u64, actual: u64 },
    #[error("pad byte at offset {offset} is {value:#04x}, want 0")]
    PaddingNotZero { offset: u64, value: u8 },
    #[error("no chunk {index} for the {what}")]
    MissingChunk { index: usize, what: &'static str },
    #[error("{what} offset mismatch: expected {expected}, actual {actual}")]
    OffsetMismatch {
        what: &'static str,
        expected: u32,
        actual: u32,
    },
    #[error("resource {0} is not in the resource directory")]
    MissingResource(ResourceId),
    #[error("resource {id}: expected {expected}, found {found}")]
    ResourceMismatch {
        id: ResourceId,
        expected: FourCC,
        found: FourCC,
    },
    #[error("resource {id}: size mismatch: expected {expected}, actual {actual}")]
    SizeMismatch { id: ResourceId, expected: u32, actual: u32 },
    #[error("resource {id} points at offset {offset}, where no chunk starts")]
    UnmappedOffset { id: ResourceId, offset: u32 },
    #[error("resource {owner} owns none of {expected:?}")]
    MissingRecord { owner: ResourceId, expected: Vec<FourCC> },
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Chunk(#[from] ReadChunkError),
    #[error(transparent)]
    Value(#[from] ReadValueError),
    #[error(transparent)]
    Io(#[from] io::Error),
}
