use byteorder::{BigEndian, ReadBytesExt};
use crate::chunk::*;
use crate::io::value::*;

use std::io::{self, Read, Seek, SeekFrom};
use thiserror::Error;

// Record

/// A fixed-layout chunk payload that is decoded once its chunk is known.
pub trait Record: Sized {
    /// Tags this record may be stored under, preferred tag first.
    const FOURCCS: &'static [FourCC];
    /// Exact payload size; these records have no optional trailing fields.
    const LENGTH: u32;

    /// Decodes the payload, with `rdr` positioned just past the chunk header.
    fn read_body<R: Read + Seek>(rdr: &mut R) -> Result<Self, ReadChunkError>;
}

impl Record for Config {
    const FOURCCS: &'static [FourCC] = &[FourCC::CONFIG, FourCC::CONFIG_OLD];
    const LENGTH: u32 = Config::LENGTH;

    // The config block is big-endian in XFIR files too.
    fn read_body<R: Read + Seek>(rdr: &mut R) -> Result<Config, ReadChunkError> {
        let cfg = rdr.read_value(u64::from(Config::LENGTH), |r| {
            let length = r.read_i16::<BigEndian>()?;
            let file_version = r.read_i16::<BigEndian>()?;
            let source_rect = Rect {
                top: r.read_i16::<BigEndian>()?,
                left: r.read_i16::<BigEndian>()?,
                bottom: r.read_i16::<BigEndian>()?,
                right: r.read_i16::<BigEndian>()?,
            };
            let min_member = r.read_i16::<BigEndian>()?;
            let max_member = r.read_i16::<BigEndian>()?;
            let tempo = r.read_u8()?;
            r.read_u8()?;
            let bg_color1 = r.read_u8()?;
            let bg_color2 = r.read_u8()?;
            r.read_bytes::<6>()?;
            let bg_color0 = r.read_u8()?;
            r.read_bytes::<25>()?;
            let trial = r.read_u8()?;
            r.read_bytes::<15>()?;
            let old_default_palette = r.read_i16::<BigEndian>()?;
            r.read_bytes::<6>()?;
            let default_palette = r.read_u32::<BigEndian>()?;
            r.read_bytes::<4>()?;
            Ok(Config {
                length,
                file_version,
                source_rect,
                min_member,
                max_member,
                tempo,
                bg_color: [bg_color0, bg_color1, bg_color2],
                trial,
                old_default_palette,
                default_palette,
            })
        })?;
        Ok(cfg)
    }
}

// ReadChunks

pub trait ReadChunks {
    /// Checks `chunk` against the expected tags (and exact length, if any)
    /// and seeks to its payload.
    fn enter_chunk(&mut self, chunk: &Chunk, expected: &[FourCC], length: Option<u32>) -> Result<(), ReadChunkError>;
    fn read_imap<B: ByteOrder>(&mut self, chunk: &Chunk) -> Result<InitialMap, ReadChunkError>;
    fn read_mmap<B: ByteOrder>(&mut self, chunk: &Chunk) -> Result<ResourceDirectory, ReadChunkError>;
    fn read_key_table<B: ByteOrder>(&mut self, chunk: &Chunk) -> Result<KeyTable, ReadChunkError>;
    fn read_record<T: Record>(&mut self, chunk: &Chunk) -> Result<T, ReadChunkError>;
}

impl<R: Read + Seek> ReadChunks for R {
    fn enter_chunk(&mut self, chunk: &Chunk, expected: &[FourCC], length: Option<u32>) -> Result<(), ReadChunkError> {
        if !expected.contains(&chunk.fourcc) {
            return Err(ReadChunkError::UnexpectedChunk {
                offset: chunk.offset,
                expected: expected.to_vec(),
                found: chunk.fourcc,
            });
        }
        if let Some(n) = length {
            if n != chunk.size {
                return Err(ReadChunkError::UnexpectedLength {
                    offset: chunk.offset,
                    fourcc: chunk.fourcc,
                    expected: n,
                    found: chunk.size,
                });
            }
        }
        self.seek(SeekFrom::Start(chunk.data_offset()))?;
        Ok(())
    }

    fn read_imap<B: ByteOrder>(&mut self, chunk: &Chunk) -> Result<InitialMap, ReadChunkError> {
        self.enter_chunk(chunk, &[FourCC::IMAP], Some(InitialMap::LENGTH))?;
        let imap = self.read_value(u64::from(chunk.size), |r| {
            Ok(InitialMap {
                directory_count: r.read_u32::<B>()?,
                directory_offset: r.read_u32::<B>()?,
                directory_version: r.read_u32::<B>()?,
                reserved: r.read_bytes::<12>()?,
            })
        })?;
        Ok(imap)
    }

    fn read_mmap<B: ByteOrder>(&mut self, chunk: &Chunk) -> Result<ResourceDirectory, ReadChunkError> {
        self.enter_chunk(chunk, &[FourCC::MMAP], None)?;
        let count = table_entries(chunk, ResourceDirectory::HEADER_LEN, ResourceDirectory::ENTRY_LEN)?;
        let dir = self.read_value(u64::from(chunk.size), |r| {
            let properties_length = r.read_i16::<B>()?;
            let resource_length = r.read_i16::<B>()?;
            let resources_max = r.read_i32::<B>()?;
            let resources_used = r.read_i32::<B>()?;
            let last_junk_id = r.read_i32::<B>()?;
            let prev_directory_id = r.read_i32::<B>()?;
            let last_free_id = r.read_i32::<B>()?;
            // Grown as entries arrive; `count` comes from an unchecked size.
            let mut resources = Vec::new();
            for _ in 0..count {
                resources.push(ResourceDescriptor {
                    fourcc: r.read_fourcc::<B>()?,
                    size: r.read_u32::<B>()?,
                    offset: r.read_u32::<B>()?,
                    flags: r.read_u32::<B>()?,
                    last_resource_id: r.read_i32::<B>()?,
                });
            }
            Ok(ResourceDirectory {
                properties_length,
                resource_length,
                resources_max,
                resources_used,
                last_junk_id,
                prev_directory_id,
                last_free_id,
                resources,
            })
        })?;
        Ok(dir)
    }

    fn read_key_table<B: ByteOrder>(&mut self, chunk: &Chunk) -> Result<KeyTable, ReadChunkError> {
        self.enter_chunk(chunk, &[FourCC::KEY_TABLE], None)?;
        let count = table_entries(chunk, KeyTable::HEADER_LEN, KeyTable::ENTRY_LEN)?;
        let table = self.read_value(u64::from(chunk.size), |r| {
            let properties_length = r.read_i16::<B>()?;
            let key_length = r.read_i16::<B>()?;
            let keys_max = r.read_i32::<B>()?;
            let keys_used = r.read_i32::<B>()?;
            let mut entries = Vec::new();
            for _ in 0..count {
                entries.push(KeyEntry {
                    owned_id: r.read_i32::<B>()?,
                    owner_id: r.read_i32::<B>()?,
                    fourcc: r.read_fourcc::<B>()?,
                });
            }
            Ok(KeyTable {
                properties_length,
                key_length,
                keys_max,
                keys_used,
                entries,
            })
        })?;
        Ok(table)
    }

    fn read_record<T: Record>(&mut self, chunk: &Chunk) -> Result<T, ReadChunkError> {
        self.enter_chunk(chunk, T::FOURCCS, Some(T::LENGTH))?;
        T::read_body(self)
    }
}

/// Number of entries in a header-plus-fixed-entries table. The header's own
/// counts are kept for inspection; the chunk size is what bounds the table.
fn table_entries(chunk: &Chunk, header_len: u32, entry_len: u32) -> Result<u32, ReadChunkError> {
    let body = chunk.size.checked_sub(header_len).ok_or(ReadChunkError::TableTooShort {
        offset: chunk.offset,
        fourcc: chunk.fourcc,
        size: chunk.size,
        header_len,
    })?;
    let remainder = body % entry_len;
    if remainder != 0 {
        return Err(ReadChunkError::UnevenTable {
            offset: chunk.offset,
            fourcc: chunk.fourcc,
            size: chunk.size,
            header_len,
            entry_len,
            remainder,
        });
    }
    Ok(body / entry_len)
}

// ReadChunkError

#[derive(Debug, Error)]
pub enum ReadChunkError {
    #[error("at offset {offset} expected one of {expected:?} but got a {found} chunk")]
    UnexpectedChunk {
        offset: u32,
        expected: Vec<FourCC>,
        found: FourCC,
    },
    #[error("at offset {offset} expected a {fourcc} chunk with length {expected}, but got length {found}")]
    UnexpectedLength {
        offset: u32,
        fourcc: FourCC,
        expected: u32,
        found: u32,
    },
    #[error("{fourcc} chunk at offset {offset} has size {size}, smaller than its {header_len} byte header")]
    TableTooShort {
        offset: u32,
        fourcc: FourCC,
        size: u32,
        header_len: u32,
    },
    #[error(
        "{fourcc} chunk at offset {offset} has size {size}: (size - {header_len}) % {entry_len} = {remainder}, want 0"
    )]
    UnevenTable {
        offset: u32,
        fourcc: FourCC,
        size: u32,
        header_len: u32,
        entry_len: u32,
        remainder: u32,
    },
    #[error(transparent)]
    Value(#[from] ReadValueError),
    #[error(transparent)]
    Io(#[from] io::Error),
}
