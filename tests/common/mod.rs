#![allow(dead_code)]

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use std::io::Write;

pub const MOVIE_ID: i32 = 1024;
pub const CONFIG_ID: i32 = 4;
pub const FILE_VERSION: i16 = 0x4C7;
pub const DEFAULT_PALETTE: u32 = 0x0000_0010;

/// Byte-order aware writer for synthesized movie files.
struct Writer {
    little_endian: bool,
    buf: Vec<u8>,
}

impl Writer {
    fn new(little_endian: bool) -> Writer {
        Writer { little_endian, buf: Vec::new() }
    }

    fn u32(&mut self, v: u32) {
        if self.little_endian {
            self.buf.write_u32::<LittleEndian>(v).unwrap();
        } else {
            self.buf.write_u32::<BigEndian>(v).unwrap();
        }
    }

    fn i32(&mut self, v: i32) {
        self.u32(v as u32);
    }

    fn i16(&mut self, v: i16) {
        if self.little_endian {
            self.buf.write_i16::<LittleEndian>(v).unwrap();
        } else {
            self.buf.write_i16::<BigEndian>(v).unwrap();
        }
    }

    fn tag(&mut self, tag: [u8; 4]) {
        if self.little_endian {
            self.buf.write_all(&[tag[3], tag[2], tag[1], tag[0]]).unwrap();
        } else {
            self.buf.write_all(&tag).unwrap();
        }
    }
}

/// A small but complete movie: `imap`, `mmap`, `KEY*`, a config block and
/// any extra chunks, with fields tests can tamper with before building.
pub struct Fixture {
    pub little_endian: bool,
    pub version: [u8; 4],
    pub config_tag: [u8; 4],
    pub extra: Vec<([u8; 4], Vec<u8>)>,
    pub extra_keys: Vec<(i32, i32, [u8; 4])>,
    /// Added to the resource directory offset recorded in `imap`.
    pub imap_offset_adjust: i32,
    /// Added to the offset the `KEY*` resource entry records.
    pub key_offset_adjust: i32,
    /// Tag written into resource slot 3; the chunk itself stays `KEY*`.
    pub key_slot_tag: [u8; 4],
    /// Added to the offset the config resource entry records.
    pub config_offset_adjust: i32,
    /// Added to the size the config resource entry records.
    pub config_size_adjust: i32,
    /// Bytes appended to the config payload, kept in step with its entry.
    pub config_extra_len: usize,
    /// Leaves out the config chunk and its resource entry.
    pub omit_config: bool,
    /// Writes only this many resource entries.
    pub mmap_entries: Option<usize>,
    pub trailing: Vec<u8>,
}

impl Fixture {
    pub fn new(little_endian: bool) -> Fixture {
        Fixture {
            little_endian,
            version: *b"MV93",
            config_tag: *b"DRCF",
            extra: Vec::new(),
            extra_keys: Vec::new(),
            imap_offset_adjust: 0,
            key_offset_adjust: 0,
            key_slot_tag: *b"KEY*",
            config_offset_adjust: 0,
            config_size_adjust: 0,
            config_extra_len: 0,
            omit_config: false,
            mmap_entries: None,
            trailing: Vec::new(),
        }
    }

    fn footprint(size: usize) -> u32 {
        (8 + size + size % 2) as u32
    }

    fn adjust(v: u32, by: i32) -> u32 {
        (v as i64 + by as i64) as u32
    }

    pub fn build(&self) -> Vec<u8> {
        let keys = self.keys();

        let mut tags = vec![*b"imap", *b"mmap", *b"KEY*"];
        let mut sizes = vec![24, 0, 12 + 12 * keys.len()];
        let mut config = config_bytes();
        config.resize(config.len() + self.config_extra_len, 0);
        if !self.omit_config {
            tags.push(self.config_tag);
            sizes.push(config.len());
        }
        tags.extend(self.extra.iter().map(|(tag, _)| *tag));
        sizes.extend(self.extra.iter().map(|(_, data)| data.len()));

        // RIFX plus one entry per chunk.
        let entry_count = self.mmap_entries.unwrap_or(1 + tags.len());
        sizes[1] = 24 + 20 * entry_count;

        let mut offsets = Vec::new();
        let mut offset = 12u32;
        for &size in &sizes {
            offsets.push(offset);
            offset += Self::footprint(size);
        }
        let declared_size = offset - 8;

        // imap
        let mut imap = Writer::new(self.little_endian);
        imap.u32(1);
        imap.u32(Self::adjust(offsets[1], self.imap_offset_adjust));
        imap.u32(0);
        imap.buf.extend_from_slice(&[0; 12]);

        // mmap: RIFX, imap, mmap, KEY*, config, extras.
        let mut entries = vec![(*b"RIFX", declared_size, 0u32)];
        for (i, (&tag, &size)) in tags.iter().zip(&sizes).enumerate() {
            entries.push((tag, size as u32, offsets[i]));
        }
        let key = &mut entries[3];
        key.0 = self.key_slot_tag;
        key.2 = Self::adjust(key.2, self.key_offset_adjust);
        if !self.omit_config {
            let cfg = &mut entries[4];
            cfg.1 = Self::adjust(cfg.1, self.config_size_adjust);
            cfg.2 = Self::adjust(cfg.2, self.config_offset_adjust);
        }
        entries.truncate(entry_count);

        let mut mmap = Writer::new(self.little_endian);
        mmap.i16(24);
        mmap.i16(20);
        mmap.i32(entry_count as i32);
        mmap.i32(entry_count as i32);
        mmap.i32(-1);
        mmap.i32(-1);
        mmap.i32(-1);
        for &(tag, size, offset) in &entries {
            mmap.tag(tag);
            mmap.u32(size);
            mmap.u32(offset);
            mmap.u32(0);
            mmap.i32(-1);
        }

        // KEY*
        let mut key = Writer::new(self.little_endian);
        key.i16(12);
        key.i16(12);
        key.i32(keys.len() as i32);
        key.i32(keys.len() as i32);
        for &(owned, owner, tag) in &keys {
            key.i32(owned);
            key.i32(owner);
            key.tag(tag);
        }

        let mut payloads = vec![imap.buf, mmap.buf, key.buf];
        if !self.omit_config {
            payloads.push(config);
        }
        payloads.extend(self.extra.iter().map(|(_, data)| data.clone()));

        let mut w = Writer::new(self.little_endian);
        w.buf.write_all(if self.little_endian { b"XFIR" } else { b"RIFX" }).unwrap();
        w.u32(declared_size);
        w.tag(self.version);
        for (tag, payload) in tags.iter().zip(&payloads) {
            w.tag(*tag);
            w.u32(payload.len() as u32);
            w.buf.write_all(payload).unwrap();
            if payload.len() % 2 != 0 {
                w.buf.push(0);
            }
        }
        w.buf.extend_from_slice(&self.trailing);
        w.buf
    }

    fn keys(&self) -> Vec<(i32, i32, [u8; 4])> {
        let mut keys = vec![(CONFIG_ID, MOVIE_ID, self.config_tag)];
        keys.extend(self.extra_keys.iter().copied());
        keys
    }
}

/// 84-byte config block; always big-endian.
pub fn config_bytes() -> Vec<u8> {
    let mut buf = Vec::new();
    buf.write_i16::<BigEndian>(84).unwrap();
    buf.write_i16::<BigEndian>(FILE_VERSION).unwrap();
    for v in [0i16, 0, 480, 640, 1, 3] {
        buf.write_i16::<BigEndian>(v).unwrap();
    }
    buf.extend_from_slice(&[15, 0, 0x11, 0x22]);
    buf.extend_from_slice(&[0; 6]);
    buf.push(0x33);
    buf.extend_from_slice(&[0; 25]);
    buf.push(0);
    buf.extend_from_slice(&[0; 15]);
    buf.write_i16::<BigEndian>(-1).unwrap();
    buf.extend_from_slice(&[0; 6]);
    buf.write_u32::<BigEndian>(DEFAULT_PALETTE).unwrap();
    buf.extend_from_slice(&[0; 4]);
    buf
}
