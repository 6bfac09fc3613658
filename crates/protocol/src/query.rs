//! Security-information query flags carried by ACL upcalls.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use crate::cursor::{ReplyWriter, UpcallReader};
use crate::error::CodecError;

/// Bit set selecting which parts of a file's security information the driver
/// wants.
///
/// Unknown bits are preserved so a newer driver can be logged faithfully, but
/// only the four named flags have any effect.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueryMask(u32);

impl QueryMask {
    /// Owner identity requested.
    pub const OWNER: Self = Self(0x1);
    /// Owning group identity requested.
    pub const GROUP: Self = Self(0x2);
    /// Discretionary ACL requested.
    pub const DACL: Self = Self(0x4);
    /// System ACL requested.
    pub const SACL: Self = Self(0x8);

    /// Encoded size of the mask.
    pub const WIRE_LEN: usize = 4;

    /// Creates a mask with no flags set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Wraps a raw mask value.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw mask value.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` when every flag in `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` when no flag is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Reads a mask from the request buffer.
    pub fn decode(reader: &mut UpcallReader<'_>) -> Result<Self, CodecError> {
        reader.read_u32().map(Self)
    }

    /// Writes the mask into a buffer.
    pub fn encode(self, writer: &mut ReplyWriter<'_>) -> Result<(), CodecError> {
        writer.write_u32(self.0)
    }
}

impl BitOr for QueryMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for QueryMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for QueryMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(QueryMask, &str); 4] = [
            (QueryMask::OWNER, "OWNER"),
            (QueryMask::GROUP, "GROUP"),
            (QueryMask::DACL, "DACL"),
            (QueryMask::SACL, "SACL"),
        ];

        let mut first = true;
        for (flag, name) in NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        if first {
            f.write_str("NONE")?;
        }
        write!(f, " ({:#x})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_checks_each_flag() {
        let mask = QueryMask::from_raw(0x3);
        assert!(mask.contains(QueryMask::OWNER));
        assert!(mask.contains(QueryMask::GROUP));
        assert!(!mask.contains(QueryMask::DACL));
        assert!(!mask.contains(QueryMask::SACL));
        assert_eq!(mask, QueryMask::OWNER | QueryMask::GROUP);
    }

    #[test]
    fn display_lists_flags() {
        assert_eq!(
            (QueryMask::OWNER | QueryMask::DACL).to_string(),
            "OWNER|DACL (0x5)"
        );
        assert_eq!(QueryMask::empty().to_string(), "NONE (0x0)");
    }

    #[test]
    fn decode_reads_four_bytes() {
        let wire = 0x8u32.to_ne_bytes();
        let mut reader = UpcallReader::new(&wire);
        assert_eq!(QueryMask::decode(&mut reader).unwrap(), QueryMask::SACL);
    }
}
