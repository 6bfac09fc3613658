//! Opaque references to daemon-owned objects carried in upcalls.

use std::fmt;

use crate::cursor::{ReplyWriter, UpcallReader};
use crate::error::CodecError;

/// Opaque token identifying a root or open-state object held by the daemon.
///
/// The driver receives these tokens when a mount or open completes and hands
/// them back verbatim in later upcalls. On the wire a token occupies
/// [`HandleToken::WIRE_LEN`] bytes in native byte order, matching a
/// pointer-sized handle on 64-bit hosts.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HandleToken(u64);

impl HandleToken {
    /// Encoded size of a token.
    pub const WIRE_LEN: usize = 8;

    /// Wraps a raw token value.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw token value.
    #[must_use]
    pub const fn as_raw(self) -> u64 {
        self.0
    }

    /// Returns the token in its wire form.
    #[must_use]
    pub const fn to_wire(self) -> [u8; Self::WIRE_LEN] {
        self.0.to_ne_bytes()
    }

    /// Reads a token from the request buffer.
    pub fn decode(reader: &mut UpcallReader<'_>) -> Result<Self, CodecError> {
        reader.read_u64().map(Self)
    }

    /// Writes the token into a reply.
    pub fn encode(self, writer: &mut ReplyWriter<'_>) -> Result<(), CodecError> {
        writer.write_u64(self.0)
    }
}

impl fmt::Display for HandleToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
