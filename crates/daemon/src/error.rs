//! crates/daemon/src/error.rs
//!
//! Failures of a single upcall and the status codes reported for them.

use metadata::IdentityError;
use protocol::envelope::UnknownOpcode;
use protocol::{CodecError, HandleToken, Opcode, status};
use thiserror::Error;

/// Why an upcall did not complete.
///
/// The dispatcher writes [`status`](Self::status) into the reply envelope; no
/// failure is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpcallError {
    /// The request ended before a required field.
    #[error("malformed upcall arguments: {0}")]
    Parse(#[source] CodecError),
    /// A handle token did not name a live object.
    #[error("unknown handle {0}")]
    InvalidHandle(HandleToken),
    /// The remote GETATTR failed.
    #[error("remote attribute fetch failed with status {0}")]
    AttributeFetch(u32),
    /// A principal name could not be mapped.
    #[error("identity resolution failed: {0}")]
    IdentityResolution(#[from] IdentityError),
    /// The reply did not fit into the reply buffer.
    #[error("reply does not fit: {0}")]
    Overflow(#[source] CodecError),
    /// No operation is registered for the opcode.
    #[error(transparent)]
    UnknownOpcode(#[from] UnknownOpcode),
    /// The operation cannot produce a reply for these arguments.
    #[error("{0} is not supported for this request")]
    NotSupported(Opcode),
}

impl UpcallError {
    /// Status code written into the reply envelope.
    ///
    /// Never zero: a failure whose underlying status is zero reports
    /// `INTERNAL_ERROR` so the driver cannot mistake it for success.
    #[must_use]
    pub const fn status(&self) -> u32 {
        let code = match self {
            Self::Parse(_) => status::INSUFFICIENT_BUFFER,
            Self::InvalidHandle(_) => status::INVALID_HANDLE,
            Self::AttributeFetch(code) => *code,
            Self::IdentityResolution(err) => err.status(),
            Self::Overflow(_) => status::BUFFER_OVERFLOW,
            Self::UnknownOpcode(_) | Self::NotSupported(_) => status::NOT_SUPPORTED,
        };
        if code == status::SUCCESS {
            status::INTERNAL_ERROR
        } else {
            code
        }
    }
}

impl From<CodecError> for UpcallError {
    fn from(err: CodecError) -> Self {
        if err.is_overflow() {
            Self::Overflow(err)
        } else {
            Self::Parse(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_errors_split_by_direction() {
        let underflow = CodecError::Underflow {
            needed: 8,
            remaining: 3,
        };
        let overflow = CodecError::Overflow {
            needed: 16,
            remaining: 15,
        };
        assert_eq!(UpcallError::from(underflow), UpcallError::Parse(underflow));
        assert_eq!(UpcallError::from(overflow).status(), status::BUFFER_OVERFLOW);
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            UpcallError::InvalidHandle(HandleToken::from_raw(1)).status(),
            status::INVALID_HANDLE
        );
        assert_eq!(UpcallError::AttributeFetch(10021).status(), 10021);
        assert_eq!(
            UpcallError::AttributeFetch(0).status(),
            status::INTERNAL_ERROR
        );
        assert_eq!(
            UpcallError::from(UnknownOpcode(99)).status(),
            status::NOT_SUPPORTED
        );
        assert_eq!(
            UpcallError::NotSupported(Opcode::AclQuery).status(),
            status::NOT_SUPPORTED
        );
        let lookup = IdentityError::Lookup {
            account: "alice".into(),
            status: 1317,
        };
        assert_eq!(UpcallError::from(lookup).status(), 1317);
        let zero = IdentityError::Lookup {
            account: "alice".into(),
            status: 0,
        };
        assert_eq!(UpcallError::from(zero).status(), status::INTERNAL_ERROR);
    }
}
