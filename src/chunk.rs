use std::fmt;
use thiserror::Error;

// FourCC

/// A four-character type tag, always held in its big-endian reading order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub const IMAP: FourCC = FourCC(*b"imap");
    pub const MMAP: FourCC = FourCC(*b"mmap");
    pub const KEY_TABLE: FourCC = FourCC(*b"KEY*");
    pub const CONFIG: FourCC = FourCC(*b"DRCF");
    pub const CONFIG_OLD: FourCC = FourCC(*b"VWCF");
    pub const FREE: FourCC = FourCC(*b"free");
    pub const JUNK: FourCC = FourCC(*b"junk");

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl From<&[u8; 4]> for FourCC {
    fn from(raw: &[u8; 4]) -> FourCC {
        FourCC(*raw)
    }
}

impl PartialEq<&str> for FourCC {
    fn eq(&self, other: &&str) -> bool {
        &self.0[..] == other.as_bytes()
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02x}", b)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "'{}'", self)
    }
}

// Chunk

/// A top-level chunk found by the container walk. `offset` is the absolute
/// position of the chunk's tag field; the payload starts 8 bytes later.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chunk {
    pub fourcc: FourCC,
    pub size: u32,
    pub offset: u32,
}

impl Chunk {
    pub const HEADER_LEN: u32 = 8;

    pub fn data_offset(&self) -> u64 {
        u64::from(self.offset) + u64::from(Self::HEADER_LEN)
    }

    /// Bytes taken up in the container, header and pad byte included.
    pub fn footprint(&self) -> u64 {
        u64::from(Self::HEADER_LEN) + u64::from(self.size) + u64::from(self.size % 2)
    }
}

// ResourceId

/// Position of an entry in the resource directory.
///
/// Resource IDs carry no field of their own in the file; an entry's ID is
/// its index in the `mmap` table, and every other structure refers to
/// resources by that index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub u32);

impl ResourceId {
    /// By format convention slot 3 of the resource directory always
    /// describes the `KEY*` ownership table.
    pub const KEY_TABLE: ResourceId = ResourceId(3);
    /// Owner of the movie-wide records such as the config block.
    pub const MOVIE: ResourceId = ResourceId(1024);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<i32> for ResourceId {
    type Error = LookupError;

    fn try_from(raw: i32) -> Result<ResourceId, LookupError> {
        u32::try_from(raw)
            .map(ResourceId)
            .map_err(|_| LookupError::InvalidResourceId(raw))
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// InitialMap

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitialMap {
    pub directory_count: u32,
    pub directory_offset: u32,
    pub directory_version: u32,
    pub reserved: [u8; 12],
}

impl InitialMap {
    pub const LENGTH: u32 = 4 * 3 + 12;
}

// ResourceDirectory

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceDirectory {
    /// Seems to always be 24.
    pub properties_length: i16,
    /// Seems to always be 20.
    pub resource_length: i16,
    pub resources_max: i32,
    pub resources_used: i32,
    pub last_junk_id: i32,
    pub prev_directory_id: i32,
    pub last_free_id: i32,
    pub resources: Vec<ResourceDescriptor>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub fourcc: FourCC,
    pub size: u32,
    pub offset: u32,
    pub flags: u32,
    pub last_resource_id: i32,
}

impl ResourceDirectory {
    pub const HEADER_LEN: u32 = 2 * 2 + 4 * 5;
    pub const ENTRY_LEN: u32 = 4 + 4 * 3 + 4;

    pub fn get(&self, id: ResourceId) -> Option<&ResourceDescriptor> {
        self.resources.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, &ResourceDescriptor)> {
        self.resources
            .iter()
            .enumerate()
            .map(|(i, r)| (ResourceId(i as u32), r))
    }

    /// Resources that hold data, skipping `free` and `junk` slots.
    pub fn live(&self) -> impl Iterator<Item = (ResourceId, &ResourceDescriptor)> {
        self.iter()
            .filter(|(_, r)| r.fourcc != FourCC::FREE && r.fourcc != FourCC::JUNK)
    }
}

// KeyTable

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyTable {
    /// Seems to always be 12.
    pub properties_length: i16,
    /// Seems to always be 12.
    pub key_length: i16,
    pub keys_max: i32,
    pub keys_used: i32,
    pub entries: Vec<KeyEntry>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyEntry {
    pub owned_id: i32,
    pub owner_id: i32,
    /// Tag of the owned resource.
    pub fourcc: FourCC,
}

impl KeyTable {
    pub const HEADER_LEN: u32 = 2 * 2 + 4 * 2;
    pub const ENTRY_LEN: u32 = 4 * 3;

    /// Finds the resource of type `fourcc` owned by `owner`.
    ///
    /// An owner holds at most one resource of each type; a table with two
    /// matching keys is rejected rather than resolved either way.
    pub fn lookup(&self, owner: ResourceId, fourcc: FourCC) -> Result<Option<ResourceId>, LookupError> {
        let mut owned: Option<i32> = None;
        for e in &self.entries {
            if i64::from(e.owner_id) != i64::from(owner.0) || e.fourcc != fourcc {
                continue;
            }
            if let Some(first) = owned {
                return Err(LookupError::Ambiguous {
                    owner,
                    fourcc,
                    first,
                    second: e.owned_id,
                });
            }
            owned = Some(e.owned_id);
        }
        owned.map(ResourceId::try_from).transpose()
    }
}

// LookupError

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("resource {owner} owns more than one {fourcc} resource: {first} and {second}")]
    Ambiguous {
        owner: ResourceId,
        fourcc: FourCC,
        first: i32,
        second: i32,
    },
    #[error("invalid resource id {0}")]
    InvalidResourceId(i32),
}

// Config

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub top: i16,
    pub left: i16,
    pub bottom: i16,
    pub right: i16,
}

impl Rect {
    pub fn width(&self) -> i32 {
        i32::from(self.right) - i32::from(self.left)
    }

    pub fn height(&self) -> i32 {
        i32::from(self.bottom) - i32::from(self.top)
    }
}

/// Movie configuration block (`DRCF`, or `VWCF` in older movies).
///
/// Every field is big-endian no matter which byte order the container uses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub length: i16,
    pub file_version: i16,
    pub source_rect: Rect,
    /// Obsolete, the cast list holds this.
    pub min_member: i16,
    /// Obsolete, the cast list holds this.
    pub max_member: i16,
    pub tempo: u8,
    pub bg_color: [u8; 3],
    pub trial: u8,
    pub old_default_palette: i16,
    pub default_palette: u32,
}

impl Config {
    pub const LENGTH: u32 = 84;
    pub const PROTECTED_VERSION: i16 = 0x163C;
    const LAST_OLD_PALETTE_VERSION: i16 = 0x45D;

    pub fn is_protected(&self) -> bool {
        self.file_version == Self::PROTECTED_VERSION
    }

    pub fn is_trial(&self) -> bool {
        self.trial != 0
    }

    /// Palette the movie starts with. Files up to version 0x45D only fill in
    /// the old 16-bit field.
    pub fn effective_palette(&self) -> i64 {
        if self.file_version <= Self::LAST_OLD_PALETTE_VERSION {
            i64::from(self.old_default_palette)
        } else {
            i64::from(self.default_palette)
        }
    }
}
