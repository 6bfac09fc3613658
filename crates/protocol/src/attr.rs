//! NFSv4 attribute request bitmaps (`bitmap4`).
//!
//! Attribute numbers follow RFC 7530/8881: attribute `n` lives in word
//! `n / 32` at bit `n % 32`.

use std::fmt;

/// Attribute numbers used by the upcall handlers.
pub mod fattr4 {
    /// Object type.
    pub const TYPE: u32 = 1;
    /// Change attribute.
    pub const CHANGE: u32 = 3;
    /// Size in bytes.
    pub const SIZE: u32 = 4;
    /// Filesystem id.
    pub const FSID: u32 = 8;
    /// Access control list.
    pub const ACL: u32 = 12;
    /// File id.
    pub const FILEID: u32 = 20;
    /// Mode bits.
    pub const MODE: u32 = 33;
    /// Link count.
    pub const NUMLINKS: u32 = 35;
    /// Owner principal.
    pub const OWNER: u32 = 36;
    /// Owning group principal.
    pub const OWNER_GROUP: u32 = 37;
    /// Last access time.
    pub const TIME_ACCESS: u32 = 47;
    /// Creation time.
    pub const TIME_CREATE: u32 = 50;
    /// Last modification time.
    pub const TIME_MODIFY: u32 = 53;
}

/// Number of 32-bit words the daemon ever sends in a request bitmap.
pub const BITMAP_WORDS: usize = 3;

/// Attribute request bitmap.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct AttrBitmap {
    words: [u32; BITMAP_WORDS],
}

impl AttrBitmap {
    /// Creates an empty bitmap.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            words: [0; BITMAP_WORDS],
        }
    }

    /// The attribute set every GETATTR issued by the daemon asks for: type,
    /// change, size, fsid, fileid, mode, link count, owner, owner group and the
    /// access, creation and modification times.
    #[must_use]
    pub const fn getattr_defaults() -> Self {
        Self::new()
            .with(fattr4::TYPE)
            .with(fattr4::CHANGE)
            .with(fattr4::SIZE)
            .with(fattr4::FSID)
            .with(fattr4::FILEID)
            .with(fattr4::MODE)
            .with(fattr4::NUMLINKS)
            .with(fattr4::OWNER)
            .with(fattr4::OWNER_GROUP)
            .with(fattr4::TIME_ACCESS)
            .with(fattr4::TIME_CREATE)
            .with(fattr4::TIME_MODIFY)
    }

    /// Returns a copy with `attr` set. Attributes beyond the bitmap are ignored.
    #[must_use]
    pub const fn with(mut self, attr: u32) -> Self {
        let word = (attr / 32) as usize;
        if word < BITMAP_WORDS {
            self.words[word] |= 1 << (attr % 32);
        }
        self
    }

    /// Sets `attr` in place.
    pub fn insert(&mut self, attr: u32) {
        *self = self.with(attr);
    }

    /// Returns `true` when `attr` is requested.
    #[must_use]
    pub const fn contains(&self, attr: u32) -> bool {
        let word = (attr / 32) as usize;
        word < BITMAP_WORDS && self.words[word] & (1 << (attr % 32)) != 0
    }

    /// Raw words in wire order.
    #[must_use]
    pub const fn words(&self) -> &[u32; BITMAP_WORDS] {
        &self.words
    }

    /// Number of words needed on the wire, dropping trailing zero words.
    #[must_use]
    pub fn wire_len(&self) -> usize {
        self.words
            .iter()
            .rposition(|word| *word != 0)
            .map_or(0, |last| last + 1)
    }
}

impl fmt::Display for AttrBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let words = &self.words[..self.wire_len()];
        write!(f, "{words:#010x?}")
    }
}
