//! crates/metadata/src/error.rs

use protocol::status;
use thiserror::Error;

use super::sid::{SidError, WellKnownSid};

/// Failures while mapping a principal name to an [`Identity`](crate::Identity).
///
/// An unmappable name is not an error; it resolves to the configured
/// well-known identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// The account database rejected the lookup.
    #[error("account lookup for '{account}' failed with status {status}")]
    Lookup {
        /// Account part of the principal name.
        account: String,
        /// Status reported by the account database.
        status: u32,
    },
    /// The well-known fallback identity could not be built.
    #[error("creating well-known sid {kind} failed with status {status}")]
    WellKnown {
        /// Requested kind.
        kind: WellKnownSid,
        /// Status reported by the constructor.
        status: u32,
    },
    /// A zero-length size probe succeeded, which the two-phase lookup never
    /// expects.
    #[error("size probe for '{0}' unexpectedly succeeded")]
    UnexpectedProbeSuccess(String),
    /// The backend produced bytes that are not a SID.
    #[error("invalid sid: {0}")]
    InvalidSid(#[from] SidError),
    /// The identity buffer could not be allocated.
    #[error("cannot allocate {0} bytes for an identity")]
    OutOfMemory(usize),
}

impl IdentityError {
    /// Status code reported to the driver.
    #[must_use]
    pub const fn status(&self) -> u32 {
        match self {
            Self::Lookup { status, .. } | Self::WellKnown { status, .. } => *status,
            Self::UnexpectedProbeSuccess(_) => status::INTERNAL_ERROR,
            Self::InvalidSid(_) => status::INVALID_SID,
            Self::OutOfMemory(_) => status::NOT_ENOUGH_MEMORY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_reports_backend_status() {
        let err = IdentityError::Lookup {
            account: "carol".into(),
            status: 1789,
        };
        assert_eq!(err.status(), 1789);
        assert!(err.to_string().contains("carol"));
    }

    #[test]
    fn probe_success_is_internal_error() {
        let err = IdentityError::UnexpectedProbeSuccess("dave".into());
        assert_eq!(err.status(), status::INTERNAL_ERROR);
    }

    #[test]
    fn sid_errors_convert() {
        let err: IdentityError = SidError::Revision(3).into();
        assert_eq!(err.status(), status::INVALID_SID);
    }
}
