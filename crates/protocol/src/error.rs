//! Errors raised by the bounded upcall codec.

use thiserror::Error;

/// Failures reported by [`UpcallReader`](crate::UpcallReader) and
/// [`ReplyWriter`](crate::ReplyWriter).
///
/// Both variants record how many bytes the operation needed and how many were
/// left in the buffer when it was attempted. A failed operation never moves
/// the cursor, so callers may inspect the remaining length afterwards.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum CodecError {
    /// The request buffer ended before a field could be read in full.
    #[error("upcall buffer underflow: needed {needed} bytes, {remaining} remaining")]
    Underflow {
        /// Size of the field that was being read.
        needed: usize,
        /// Bytes left in the request buffer.
        remaining: usize,
    },
    /// The reply buffer lacked capacity for the bytes being written.
    #[error("reply buffer overflow: needed {needed} bytes, {remaining} remaining")]
    Overflow {
        /// Size of the field that was being written.
        needed: usize,
        /// Capacity left in the reply buffer.
        remaining: usize,
    },
}

impl CodecError {
    /// Returns `true` when the error came from the read side of the codec.
    #[must_use]
    pub const fn is_underflow(&self) -> bool {
        matches!(self, Self::Underflow { .. })
    }

    /// Returns `true` when the error came from the write side of the codec.
    #[must_use]
    pub const fn is_overflow(&self) -> bool {
        matches!(self, Self::Overflow { .. })
    }
}
