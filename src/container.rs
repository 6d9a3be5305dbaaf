use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use crate::chunk::{Chunk, FourCC};
use crate::io::value::*;
use crate::movie::{DecodeOptions, ReadMovieError};

use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};
use tracing::{debug, trace};

// Endianness

/// Byte order of a whole file, picked by its magic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endianness {
    /// `RIFX`
    Big,
    /// `XFIR`
    Little,
}

impl Endianness {
    pub fn from_magic(magic: FourCC) -> Option<Endianness> {
        match magic.as_bytes() {
            b"RIFX" => Some(Endianness::Big),
            b"XFIR" => Some(Endianness::Little),
            _ => None,
        }
    }

    pub fn magic(self) -> FourCC {
        match self {
            Endianness::Big => FourCC(*b"RIFX"),
            Endianness::Little => FourCC(*b"XFIR"),
        }
    }
}

// Container

/// The top-level chunks of a movie file in file order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Container {
    pub endianness: Endianness,
    /// Size field of the outer header; the file is `declared_size + 8` bytes.
    pub declared_size: u32,
    /// Director version tag, e.g. `MV93`.
    pub version: FourCC,
    pub chunks: Vec<Chunk>,
    by_offset: HashMap<u32, usize>,
}

impl Container {
    /// Magic, size and version.
    pub const HEADER_LEN: u32 = 12;

    /// Walks every top-level chunk from the start of `rdr`.
    ///
    /// The chunks must tile the declared size exactly and the stream must end
    /// where the declared size says it does.
    pub fn read<R: Read + Seek>(rdr: &mut R, options: &DecodeOptions) -> Result<Container, ReadMovieError> {
        rdr.seek(SeekFrom::Start(0))?;
        let magic = rdr.read_value(4, |r| r.read_fourcc::<BigEndian>())?;
        let endianness = Endianness::from_magic(magic).ok_or(ReadMovieError::InvalidHeader(magic))?;
        match endianness {
            Endianness::Big => walk::<BigEndian, R>(rdr, endianness, options),
            Endianness::Little => walk::<LittleEndian, R>(rdr, endianness, options),
        }
    }

    pub fn chunk(&self, index: usize) -> Option<&Chunk> {
        self.chunks.get(index)
    }

    /// Finds the chunk whose header starts at `offset`, with its walk index.
    pub fn chunk_at(&self, offset: u32) -> Option<(usize, &Chunk)> {
        self.by_offset.get(&offset).map(|&i| (i, &self.chunks[i]))
    }

    /// Offset one past the last byte of the file.
    pub fn end(&self) -> u64 {
        u64::from(self.declared_size) + u64::from(Chunk::HEADER_LEN)
    }
}

fn walk<B: ByteOrder, R: Read + Seek>(
    rdr: &mut R,
    endianness: Endianness,
    options: &DecodeOptions,
) -> Result<Container, ReadMovieError> {
    let (declared_size, version) = rdr.read_value(8, |r| Ok((r.read_u32::<B>()?, r.read_fourcc::<B>()?)))?;
    debug!(?endianness, %version, declared_size, "reading container");

    if let Some(ref versions) = options.supported_versions {
        if !versions.contains(&version) {
            return Err(ReadMovieError::UnsupportedVersion(version));
        }
    }

    let stream_len = rdr.seek(SeekFrom::End(0))?;
    let minimum = Container::HEADER_LEN - Chunk::HEADER_LEN;
    if declared_size < minimum {
        return Err(ReadMovieError::DeclaredSizeTooSmall { declared: declared_size, minimum });
    }
    let end = u64::from(declared_size) + u64::from(Chunk::HEADER_LEN);
    if stream_len < end {
        return Err(ReadMovieError::Truncated { expected: end, actual: stream_len });
    }

    let mut offset = u64::from(Container::HEADER_LEN);
    rdr.seek(SeekFrom::Start(offset))?;
    let mut chunks = Vec::new();
    let mut by_offset = HashMap::new();
    while offset < end {
        let (fourcc, size) = rdr.read_value(8, |r| Ok((r.read_fourcc::<B>()?, r.read_u32::<B>()?)))?;
        let overrun = |next| ReadMovieError::ChunkOverrun { offset, fourcc, end: next, container_end: end };
        let chunk = Chunk {
            fourcc,
            size,
            offset: u32::try_from(offset).map_err(|_| overrun(offset))?,
        };
        let next = offset + chunk.footprint();
        if next > end {
            return Err(overrun(next));
        }
        trace!(index = chunks.len(), %fourcc, size, offset, "chunk");

        rdr.seek(SeekFrom::Current(i64::from(size)))?;
        if size % 2 != 0 {
            let pad = rdr.read_value(1, |r| r.read_u8())?;
            if options.require_zero_padding && pad != 0 {
                return Err(ReadMovieError::PaddingNotZero { offset: next - 1, value: pad });
            }
        }

        by_offset.insert(chunk.offset, chunks.len());
        chunks.push(chunk);
        offset = next;
    }

    if stream_len != end {
        return Err(ReadMovieError::TrailingData { end, actual: stream_len });
    }
    debug!(chunks = chunks.len(), "walked container");

    Ok(Container {
        endianness,
        declared_size,
        version,
        chunks,
        by_offset,
    })
}
