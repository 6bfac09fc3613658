//! crates/metadata/src/sid.rs
//! Security identifiers and their binary encoding.
//!
//! The encoding is the one the driver consumes: a revision byte (always 1), a
//! sub-authority count, a 48-bit identifier authority stored big-endian, then
//! each 32-bit sub-authority little-endian. An encoded SID is therefore
//! `8 + 4 * n` bytes long with at most 15 sub-authorities.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// The only SID revision in use.
pub const SID_REVISION: u8 = 1;

/// Maximum number of sub-authorities a SID may carry.
pub const SID_MAX_SUB_AUTHORITIES: usize = 15;

/// Size of the fixed SID header (revision, count and authority).
pub const SID_HEADER_LEN: usize = 8;

/// Largest possible encoded SID.
pub const SID_MAX_LEN: usize = SID_HEADER_LEN + 4 * SID_MAX_SUB_AUTHORITIES;

const AUTHORITY_LIMIT: u64 = 1 << 48;

/// Identifier authority used for Unix users (`S-1-22-1-<uid>`) and groups
/// (`S-1-22-2-<gid>`).
pub const UNIX_AUTHORITY: u64 = 22;
const UNIX_USER_RID: u32 = 1;
const UNIX_GROUP_RID: u32 = 2;

/// Structural problems found while building or decoding a SID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SidError {
    /// Fewer bytes than the header or the declared sub-authorities need.
    #[error("sid truncated: {len} bytes, need {needed}")]
    Truncated {
        /// Bytes available.
        len: usize,
        /// Bytes required.
        needed: usize,
    },
    /// Trailing bytes after the declared sub-authorities.
    #[error("sid length mismatch: {len} bytes, encoded sid is {expected}")]
    LengthMismatch {
        /// Bytes available.
        len: usize,
        /// Length implied by the sub-authority count.
        expected: usize,
    },
    /// Revision byte other than 1.
    #[error("unsupported sid revision {0}")]
    Revision(u8),
    /// More than 15 sub-authorities.
    #[error("sid has {0} sub-authorities, at most 15 allowed")]
    TooManySubAuthorities(usize),
    /// Authority does not fit in 48 bits.
    #[error("sid authority {0} exceeds 48 bits")]
    AuthorityOutOfRange(u64),
}

/// A security identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sid {
    authority: u64,
    sub_authorities: Vec<u32>,
}

impl Sid {
    /// Builds a SID from its authority and sub-authorities.
    pub fn new(authority: u64, sub_authorities: &[u32]) -> Result<Self, SidError> {
        if authority >= AUTHORITY_LIMIT {
            return Err(SidError::AuthorityOutOfRange(authority));
        }
        if sub_authorities.len() > SID_MAX_SUB_AUTHORITIES {
            return Err(SidError::TooManySubAuthorities(sub_authorities.len()));
        }
        Ok(Self {
            authority,
            sub_authorities: sub_authorities.to_vec(),
        })
    }

    /// `S-1-22-1-<uid>`.
    #[must_use]
    pub fn unix_user(uid: u32) -> Self {
        Self {
            authority: UNIX_AUTHORITY,
            sub_authorities: vec![UNIX_USER_RID, uid],
        }
    }

    /// `S-1-22-2-<gid>`.
    #[must_use]
    pub fn unix_group(gid: u32) -> Self {
        Self {
            authority: UNIX_AUTHORITY,
            sub_authorities: vec![UNIX_GROUP_RID, gid],
        }
    }

    /// The 48-bit identifier authority.
    #[must_use]
    pub const fn authority(&self) -> u64 {
        self.authority
    }

    /// The sub-authorities, most significant first.
    #[must_use]
    pub fn sub_authorities(&self) -> &[u32] {
        &self.sub_authorities
    }

    /// Length of the binary encoding.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        SID_HEADER_LEN + 4 * self.sub_authorities.len()
    }

    /// Writes the binary encoding into the front of `out`.
    ///
    /// Returns the number of bytes written, or `None` when `out` is shorter
    /// than [`encoded_len`](Self::encoded_len). Nothing is written on failure.
    pub fn write_to(&self, out: &mut [u8]) -> Option<usize> {
        let len = self.encoded_len();
        let out = out.get_mut(..len)?;
        out[0] = SID_REVISION;
        out[1] = self.sub_authorities.len() as u8;
        out[2..8].copy_from_slice(&self.authority.to_be_bytes()[2..]);
        for (chunk, sub) in out[SID_HEADER_LEN..]
            .chunks_exact_mut(4)
            .zip(&self.sub_authorities)
        {
            chunk.copy_from_slice(&sub.to_le_bytes());
        }
        Some(len)
    }

    /// Returns the binary encoding.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0; self.encoded_len()];
        let _ = self.write_to(&mut bytes);
        bytes
    }

    /// Decodes and validates a binary SID. The slice must hold exactly one SID.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SidError> {
        if bytes.len() < SID_HEADER_LEN {
            return Err(SidError::Truncated {
                len: bytes.len(),
                needed: SID_HEADER_LEN,
            });
        }
        if bytes[0] != SID_REVISION {
            return Err(SidError::Revision(bytes[0]));
        }
        let count = usize::from(bytes[1]);
        if count > SID_MAX_SUB_AUTHORITIES {
            return Err(SidError::TooManySubAuthorities(count));
        }
        let expected = SID_HEADER_LEN + 4 * count;
        if bytes.len() < expected {
            return Err(SidError::Truncated {
                len: bytes.len(),
                needed: expected,
            });
        }
        if bytes.len() > expected {
            return Err(SidError::LengthMismatch {
                len: bytes.len(),
                expected,
            });
        }

        let mut authority = [0u8; 8];
        authority[2..].copy_from_slice(&bytes[2..8]);
        let sub_authorities = bytes[SID_HEADER_LEN..]
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();

        Ok(Self {
            authority: u64::from_be_bytes(authority),
            sub_authorities,
        })
    }

    /// Whether `bytes` hold exactly one structurally valid SID.
    #[must_use]
    pub fn is_valid(bytes: &[u8]) -> bool {
        Self::from_bytes(bytes).is_ok()
    }
}

impl fmt::Display for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{SID_REVISION}-")?;
        if self.authority > u64::from(u32::MAX) {
            write!(f, "{:#014x}", self.authority)?;
        } else {
            write!(f, "{}", self.authority)?;
        }
        for sub in &self.sub_authorities {
            write!(f, "-{sub}")?;
        }
        Ok(())
    }
}

/// Well-known SIDs the daemon can substitute for names it cannot map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WellKnownSid {
    /// `S-1-0-0`, the null SID.
    #[default]
    Null,
    /// `S-1-1-0`, Everyone.
    World,
    /// `S-1-5-7`, the anonymous logon.
    Anonymous,
}

impl WellKnownSid {
    /// All well-known kinds, in declaration order.
    pub const ALL: [Self; 3] = [Self::Null, Self::World, Self::Anonymous];

    /// The SID this kind stands for.
    #[must_use]
    pub fn sid(self) -> Sid {
        let (authority, sub) = match self {
            Self::Null => (0, 0),
            Self::World => (1, 0),
            Self::Anonymous => (5, 7),
        };
        Sid {
            authority,
            sub_authorities: vec![sub],
        }
    }

    /// Lowercase name as accepted by [`FromStr`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::World => "world",
            Self::Anonymous => "anonymous",
        }
    }
}

impl fmt::Display for WellKnownSid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a well-known SID name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown well-known sid '{0}' (expected null, world or anonymous)")]
pub struct UnknownWellKnownSid(pub String);

impl FromStr for WellKnownSid {
    type Err = UnknownWellKnownSid;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "null" => Ok(Self::Null),
            "world" | "everyone" => Ok(Self::World),
            "anonymous" => Ok(Self::Anonymous),
            _ => Err(UnknownWellKnownSid(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn well_known_sids_format() {
        assert_eq!(WellKnownSid::Null.sid().to_string(), "S-1-0-0");
        assert_eq!(WellKnownSid::World.sid().to_string(), "S-1-1-0");
        assert_eq!(WellKnownSid::Anonymous.sid().to_string(), "S-1-5-7");
    }

    #[test]
    fn null_sid_encoding() {
        assert_eq!(
            WellKnownSid::Null.sid().to_bytes(),
            [1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn unix_sids_use_authority_22() {
        let user = Sid::unix_user(1000);
        assert_eq!(user.to_string(), "S-1-22-1-1000");
        assert_eq!(user.encoded_len(), 16);

        let bytes = Sid::unix_group(0x0102_0304).to_bytes();
        assert_eq!(&bytes[..8], &[1, 2, 0, 0, 0, 0, 0, 22]);
        assert_eq!(&bytes[8..12], &2u32.to_le_bytes());
        assert_eq!(&bytes[12..], &[4, 3, 2, 1]);
    }

    #[test]
    fn large_authority_formats_as_hex() {
        let sid = Sid::new(0x0000_1234_5678_9abc, &[1]).unwrap();
        assert_eq!(sid.to_string(), "S-1-0x123456789abc-1");
    }

    #[test]
    fn new_rejects_out_of_range() {
        assert_eq!(
            Sid::new(1 << 48, &[]),
            Err(SidError::AuthorityOutOfRange(1 << 48))
        );
        assert_eq!(
            Sid::new(5, &[0; 16]),
            Err(SidError::TooManySubAuthorities(16))
        );
    }

    #[test]
    fn from_bytes_validates_structure() {
        assert_eq!(
            Sid::from_bytes(&[1, 1, 0]),
            Err(SidError::Truncated { len: 3, needed: 8 })
        );
        assert_eq!(
            Sid::from_bytes(&[2, 0, 0, 0, 0, 0, 0, 0]),
            Err(SidError::Revision(2))
        );
        assert_eq!(
            Sid::from_bytes(&[1, 1, 0, 0, 0, 0, 0, 5]),
            Err(SidError::Truncated { len: 8, needed: 12 })
        );
        assert_eq!(
            Sid::from_bytes(&[1, 0, 0, 0, 0, 0, 0, 5, 9]),
            Err(SidError::LengthMismatch {
                len: 9,
                expected: 8
            })
        );
        assert!(!Sid::is_valid(&[1, 16, 0, 0, 0, 0, 0, 5]));
    }

    #[test]
    fn write_to_refuses_short_output() {
        let sid = WellKnownSid::Anonymous.sid();
        let mut out = [0xAAu8; 11];
        assert_eq!(sid.write_to(&mut out), None);
        assert!(out.iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn well_known_names_parse() {
        for kind in WellKnownSid::ALL {
            assert_eq!(kind.name().parse::<WellKnownSid>(), Ok(kind));
        }
        assert_eq!("Everyone".parse(), Ok(WellKnownSid::World));
        assert!("nobody".parse::<WellKnownSid>().is_err());
    }

    proptest! {
        #[test]
        fn decoded_sid_matches_encoding(
            authority in 0u64..(1 << 48),
            subs in proptest::collection::vec(any::<u32>(), 0..=SID_MAX_SUB_AUTHORITIES),
        ) {
            let sid = Sid::new(authority, &subs).unwrap();
            let bytes = sid.to_bytes();
            prop_assert_eq!(bytes.len(), sid.encoded_len());
            prop_assert_eq!(Sid::from_bytes(&bytes).unwrap(), sid);
        }
    }
}
