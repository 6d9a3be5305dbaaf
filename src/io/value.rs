use byteorder::{BigEndian, LittleEndian};
use crate::chunk::FourCC;

use std::io::{self, Read, Seek};
use thiserror::Error;

// ReadDirectorValues

/// Director-specific reads over a seekable byte source. Plain integers come
/// straight from [`byteorder::ReadBytesExt`]; [`read_value`](Self::read_value) wraps a
/// group of such reads so that running out of bytes is reported as
/// [`ReadValueError::ShortRead`] at the offset the group started from.
pub trait ReadDirectorValues: Read + Seek {
    fn read_value<T, F>(&mut self, wanted: u64, read: F) -> Result<T, ReadValueError>
    where
        F: FnOnce(&mut Self) -> io::Result<T>,
    {
        let offset = self.stream_position()?;
        read(self).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => ReadValueError::ShortRead { offset, wanted },
            _ => ReadValueError::Io(e),
        })
    }

    fn read_fourcc<B: ByteOrder>(&mut self) -> io::Result<FourCC> {
        Ok(B::fourcc(self.read_bytes::<4>()?))
    }

    fn read_bytes<const N: usize>(&mut self) -> io::Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }
}

impl<R: Read + Seek + ?Sized> ReadDirectorValues for R {}

// ByteOrder extension

/// Byte order of a movie file, extended with how that order stores fourCCs.
pub trait ByteOrder: byteorder::ByteOrder {
    /// Turns the four raw bytes of a tag field into the tag as it reads in a
    /// big-endian file.
    fn fourcc(raw: [u8; 4]) -> FourCC;
}

impl ByteOrder for BigEndian {
    fn fourcc(raw: [u8; 4]) -> FourCC {
        FourCC(raw)
    }
}

impl ByteOrder for LittleEndian {
    /// `XFIR` files store each tag as a little-endian u32, so the bytes come
    /// out fully reversed: `pamm` on disk is the `mmap` tag.
    fn fourcc(raw: [u8; 4]) -> FourCC {
        FourCC([raw[3], raw[2], raw[1], raw[0]])
    }
}

// ReadValueError

#[derive(Debug, Error)]
pub enum ReadValueError {
    #[error("short read at offset {offset}: wanted {wanted} bytes")]
    ShortRead { offset: u64, wanted: u64 },
    #[error(transparent)]
    Io(#[from] io::Error),
}
