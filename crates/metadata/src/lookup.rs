//! crates/metadata/src/lookup.rs
//! The account lookup primitive behind [`LookupResolver`](crate::LookupResolver).
//!
//! Account databases report the size of a SID before handing it out: the
//! caller first probes with empty buffers, learns the required lengths from an
//! [`LookupFailure::InsufficientBuffer`] reply, then retries with buffers of
//! exactly that size. Backends implement this contract; the resolver is the
//! only caller and hides the two phases from everyone else.

use std::sync::Arc;

use protocol::status;

use super::sid::WellKnownSid;

/// Classification of an account returned by a lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccountKind {
    /// A user account.
    User,
    /// A group account.
    Group,
    /// A domain object.
    Domain,
    /// A local alias.
    Alias,
    /// A built-in principal such as Everyone.
    WellKnownGroup,
    /// Any other classification, carried as the raw value.
    Other(u32),
}

/// Successful lookup: how much of each output buffer was filled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccountInfo {
    /// Bytes of SID written.
    pub sid_len: usize,
    /// Bytes of referenced domain name written.
    pub domain_len: usize,
    /// What kind of account matched.
    pub kind: AccountKind,
}

/// Why a lookup did not produce a SID.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LookupFailure {
    /// The output buffers are too small; retry with these sizes.
    InsufficientBuffer {
        /// Required SID buffer length.
        sid_len: usize,
        /// Required domain buffer length.
        domain_len: usize,
    },
    /// No account has this name.
    NoneMapped,
    /// Any other failure, with the backend's status code.
    Os(u32),
}

impl LookupFailure {
    /// Status code corresponding to this failure.
    #[must_use]
    pub const fn status(self) -> u32 {
        match self {
            Self::InsufficientBuffer { .. } => status::INSUFFICIENT_BUFFER,
            Self::NoneMapped => status::NONE_MAPPED,
            Self::Os(code) => code,
        }
    }
}

/// A local or directory account database.
pub trait AccountLookup: Send + Sync {
    /// Looks up `account`, writing its SID into `sid` and the name of the
    /// domain that owns it into `domain`.
    ///
    /// When either buffer is too small, nothing is written and
    /// [`LookupFailure::InsufficientBuffer`] reports both required sizes.
    fn lookup_account(
        &self,
        account: &str,
        sid: &mut [u8],
        domain: &mut [u8],
    ) -> Result<AccountInfo, LookupFailure>;

    /// Writes the SID of a well-known principal into `sid`, following the same
    /// size-probe contract as [`lookup_account`](Self::lookup_account).
    ///
    /// Returns the number of bytes written.
    fn create_well_known(&self, kind: WellKnownSid, sid: &mut [u8]) -> Result<usize, LookupFailure> {
        let well_known = kind.sid();
        well_known
            .write_to(sid)
            .ok_or(LookupFailure::InsufficientBuffer {
                sid_len: well_known.encoded_len(),
                domain_len: 0,
            })
    }
}

impl<L: AccountLookup + ?Sized> AccountLookup for Arc<L> {
    fn lookup_account(
        &self,
        account: &str,
        sid: &mut [u8],
        domain: &mut [u8],
    ) -> Result<AccountInfo, LookupFailure> {
        (**self).lookup_account(account, sid, domain)
    }

    fn create_well_known(&self, kind: WellKnownSid, sid: &mut [u8]) -> Result<usize, LookupFailure> {
        (**self).create_well_known(kind, sid)
    }
}

impl<L: AccountLookup + ?Sized> AccountLookup for Box<L> {
    fn lookup_account(
        &self,
        account: &str,
        sid: &mut [u8],
        domain: &mut [u8],
    ) -> Result<AccountInfo, LookupFailure> {
        (**self).lookup_account(account, sid, domain)
    }

    fn create_well_known(&self, kind: WellKnownSid, sid: &mut [u8]) -> Result<usize, LookupFailure> {
        (**self).create_well_known(kind, sid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoAccounts;

    impl AccountLookup for NoAccounts {
        fn lookup_account(
            &self,
            _account: &str,
            _sid: &mut [u8],
            _domain: &mut [u8],
        ) -> Result<AccountInfo, LookupFailure> {
            Err(LookupFailure::NoneMapped)
        }
    }

    #[test]
    fn default_well_known_probe_reports_size() {
        assert_eq!(
            NoAccounts.create_well_known(WellKnownSid::World, &mut []),
            Err(LookupFailure::InsufficientBuffer {
                sid_len: 12,
                domain_len: 0
            })
        );
    }

    #[test]
    fn default_well_known_fills_exact_buffer() {
        let mut sid = [0u8; 12];
        assert_eq!(
            NoAccounts.create_well_known(WellKnownSid::Anonymous, &mut sid),
            Ok(12)
        );
        assert_eq!(sid, [1, 1, 0, 0, 0, 0, 0, 5, 7, 0, 0, 0]);
    }

    #[test]
    fn failure_status_codes() {
        assert_eq!(LookupFailure::NoneMapped.status(), status::NONE_MAPPED);
        assert_eq!(LookupFailure::Os(5).status(), 5);
        assert_eq!(
            LookupFailure::InsufficientBuffer {
                sid_len: 1,
                domain_len: 1
            }
            .status(),
            status::INSUFFICIENT_BUFFER
        );
    }

    #[test]
    fn shared_lookup_forwards() {
        let shared: Arc<dyn AccountLookup> = Arc::new(NoAccounts);
        assert_eq!(
            shared.lookup_account("x", &mut [], &mut []),
            Err(LookupFailure::NoneMapped)
        );
    }
}
