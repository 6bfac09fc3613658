//! crates/metadata/src/resolver.rs
//! Principal name to [`Identity`] resolution.
//!
//! # Design
//!
//! [`LookupResolver`] drives an [`AccountLookup`] through its two-phase
//! contract. A probe with empty buffers discovers the SID and domain sizes.
//! Buffers of exactly those sizes are then allocated and the lookup repeated.
//! Callers see a single [`IdentityResolver::resolve`] call.
//!
//! # Invariants
//!
//! - The returned identity's length equals the number of SID bytes the backend
//!   reported.
//! - An unknown account resolves to the configured well-known identity.
//! - Buffers allocated for a failed retry are dropped before the error returns.
//! - The resolver holds no mutable state and is shared across workers.

use logging::trace_idmap;

use super::error::IdentityError;
use super::identity::Identity;
use super::lookup::{AccountLookup, LookupFailure};
use super::principal::PrincipalName;
use super::sid::{Sid, WellKnownSid};

/// Maps a remote principal name to a local identity.
pub trait IdentityResolver: Send + Sync {
    /// Resolves `name` (`account` or `account@domain`).
    fn resolve(&self, name: &str) -> Result<Identity, IdentityError>;
}

impl<R: IdentityResolver + ?Sized> IdentityResolver for std::sync::Arc<R> {
    fn resolve(&self, name: &str) -> Result<Identity, IdentityError> {
        (**self).resolve(name)
    }
}

/// [`IdentityResolver`] backed by an [`AccountLookup`].
#[derive(Debug)]
pub struct LookupResolver<L> {
    lookup: L,
    unmapped: WellKnownSid,
}

impl<L: AccountLookup> LookupResolver<L> {
    /// Creates a resolver that substitutes the null SID for unknown names.
    pub fn new(lookup: L) -> Self {
        Self {
            lookup,
            unmapped: WellKnownSid::Null,
        }
    }

    /// Chooses the well-known identity returned for unknown names.
    pub fn with_unmapped(mut self, unmapped: WellKnownSid) -> Self {
        self.unmapped = unmapped;
        self
    }

    /// The well-known kind substituted for unknown names.
    pub const fn unmapped(&self) -> WellKnownSid {
        self.unmapped
    }

    /// The underlying account database.
    pub const fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Builds the identity substituted for unknown names.
    pub fn unmapped_identity(&self) -> Result<Identity, IdentityError> {
        let kind = self.unmapped;
        let sid_len = match self.lookup.create_well_known(kind, &mut []) {
            Ok(_) => return Err(IdentityError::UnexpectedProbeSuccess(kind.to_string())),
            Err(LookupFailure::InsufficientBuffer { sid_len, .. }) => sid_len,
            Err(failure) => {
                return Err(IdentityError::WellKnown {
                    kind,
                    status: failure.status(),
                });
            }
        };

        let mut sid = allocate(sid_len)?;
        match self.lookup.create_well_known(kind, &mut sid) {
            Ok(written) => {
                sid.truncate(written);
                Ok(Identity::from_bytes(sid))
            }
            Err(failure) => {
                tracing::warn!(
                    target: "upcalld::idmap",
                    %kind,
                    status = failure.status(),
                    "creating well-known sid failed"
                );
                Err(IdentityError::WellKnown {
                    kind,
                    status: failure.status(),
                })
            }
        }
    }

    fn fetch(
        &self,
        account: &str,
        sid_len: usize,
        domain_len: usize,
    ) -> Result<Identity, IdentityError> {
        let mut sid = allocate(sid_len)?;
        let mut domain = allocate(domain_len)?;

        let info = self
            .lookup
            .lookup_account(account, &mut sid, &mut domain)
            .map_err(|failure| {
                tracing::warn!(
                    target: "upcalld::idmap",
                    account,
                    status = failure.status(),
                    "account lookup failed after size probe"
                );
                IdentityError::Lookup {
                    account: account.to_owned(),
                    status: failure.status(),
                }
            })?;
        trace_idmap!(account, kind = ?info.kind, "account lookup succeeded");

        sid.truncate(info.sid_len);
        match Sid::from_bytes(&sid) {
            Ok(parsed) => trace_idmap!(account, sid = %parsed, "mapped"),
            Err(err) => trace_idmap!(account, error = %err, "backend returned an invalid sid"),
        }
        Ok(Identity::from_bytes(sid))
    }
}

impl<L: AccountLookup> IdentityResolver for LookupResolver<L> {
    fn resolve(&self, name: &str) -> Result<Identity, IdentityError> {
        let principal = PrincipalName::parse(name);
        let account = principal.account();
        trace_idmap!(account, domain = ?principal.domain(), "mapping principal");

        match self.lookup.lookup_account(account, &mut [], &mut []) {
            Ok(_) => Err(IdentityError::UnexpectedProbeSuccess(account.to_owned())),
            Err(LookupFailure::InsufficientBuffer {
                sid_len,
                domain_len,
            }) => {
                trace_idmap!(account, sid_len, domain_len, "size probe");
                self.fetch(account, sid_len, domain_len)
            }
            Err(LookupFailure::NoneMapped) => {
                trace_idmap!(account, unmapped = %self.unmapped, "no such account");
                self.unmapped_identity()
            }
            Err(LookupFailure::Os(status)) => Err(IdentityError::Lookup {
                account: account.to_owned(),
                status,
            }),
        }
    }
}

fn allocate(len: usize) -> Result<Vec<u8>, IdentityError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| IdentityError::OutOfMemory(len))?;
    buf.resize(len, 0);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::lookup::{AccountInfo, AccountKind};
    use protocol::status;

    /// Lookup double with a single known account and a call log.
    struct OneAccount {
        name: &'static str,
        sid: Sid,
        retry_status: Option<u32>,
        calls: Mutex<Vec<(String, usize)>>,
    }

    impl OneAccount {
        fn new(name: &'static str, sid: Sid) -> Self {
            Self {
                name,
                sid,
                retry_status: None,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl AccountLookup for OneAccount {
        fn lookup_account(
            &self,
            account: &str,
            sid: &mut [u8],
            domain: &mut [u8],
        ) -> Result<AccountInfo, LookupFailure> {
            self.calls.lock().unwrap().push((account.to_owned(), sid.len()));
            if account != self.name {
                return Err(LookupFailure::NoneMapped);
            }
            let needed = self.sid.encoded_len();
            if sid.len() < needed || domain.len() < 4 {
                return Err(LookupFailure::InsufficientBuffer {
                    sid_len: needed,
                    domain_len: 4,
                });
            }
            if let Some(code) = self.retry_status {
                return Err(LookupFailure::Os(code));
            }
            self.sid.write_to(sid);
            domain[..4].copy_from_slice(b"UNIX");
            Ok(AccountInfo {
                sid_len: needed,
                domain_len: 4,
                kind: AccountKind::User,
            })
        }
    }

    #[test]
    fn resolves_with_probe_then_fetch() {
        let resolver = LookupResolver::new(OneAccount::new("alice", Sid::unix_user(1000)));
        let identity = resolver.resolve("alice@example.com").unwrap();

        assert_eq!(identity.len(), 16);
        assert_eq!(identity.to_sid().unwrap(), Sid::unix_user(1000));
        let calls = resolver.lookup().calls.lock().unwrap().clone();
        assert_eq!(calls, [("alice".to_owned(), 0), ("alice".to_owned(), 16)]);
    }

    #[test]
    fn unknown_account_resolves_to_null_sid() {
        let resolver = LookupResolver::new(OneAccount::new("alice", Sid::unix_user(1)));
        let identity = resolver.resolve("mallory@elsewhere").unwrap();
        assert_eq!(identity.as_bytes(), WellKnownSid::Null.sid().to_bytes());
    }

    #[test]
    fn unmapped_kind_is_configurable() {
        let resolver = LookupResolver::new(OneAccount::new("alice", Sid::unix_user(1)))
            .with_unmapped(WellKnownSid::Anonymous);
        let identity = resolver.resolve("nobody").unwrap();
        assert_eq!(identity.to_sid().unwrap().to_string(), "S-1-5-7");
    }

    #[test]
    fn retry_failure_reports_lookup_status() {
        let mut lookup = OneAccount::new("alice", Sid::unix_user(1));
        lookup.retry_status = Some(1789);
        let resolver = LookupResolver::new(lookup);

        let err = resolver.resolve("alice").unwrap_err();
        assert_eq!(
            err,
            IdentityError::Lookup {
                account: "alice".into(),
                status: 1789
            }
        );
    }

    struct Failing(LookupFailure);

    impl AccountLookup for Failing {
        fn lookup_account(
            &self,
            _account: &str,
            _sid: &mut [u8],
            _domain: &mut [u8],
        ) -> Result<AccountInfo, LookupFailure> {
            Err(self.0)
        }
    }

    #[test]
    fn probe_os_error_is_returned_as_is() {
        let resolver = LookupResolver::new(Failing(LookupFailure::Os(1355)));
        let err = resolver.resolve("alice@dom").unwrap_err();
        assert_eq!(err.status(), 1355);
    }

    struct AlwaysSucceeds;

    impl AccountLookup for AlwaysSucceeds {
        fn lookup_account(
            &self,
            _account: &str,
            _sid: &mut [u8],
            _domain: &mut [u8],
        ) -> Result<AccountInfo, LookupFailure> {
            Ok(AccountInfo {
                sid_len: 0,
                domain_len: 0,
                kind: AccountKind::User,
            })
        }

        fn create_well_known(
            &self,
            _kind: WellKnownSid,
            _sid: &mut [u8],
        ) -> Result<usize, LookupFailure> {
            Ok(0)
        }
    }

    #[test]
    fn successful_probe_is_internal_error() {
        let resolver = LookupResolver::new(AlwaysSucceeds);
        let err = resolver.resolve("alice").unwrap_err();
        assert_eq!(err, IdentityError::UnexpectedProbeSuccess("alice".into()));
        assert_eq!(err.status(), status::INTERNAL_ERROR);
        assert_eq!(
            resolver.unmapped_identity().unwrap_err().status(),
            status::INTERNAL_ERROR
        );
    }

    struct NoWellKnown;

    impl AccountLookup for NoWellKnown {
        fn lookup_account(
            &self,
            _account: &str,
            _sid: &mut [u8],
            _domain: &mut [u8],
        ) -> Result<AccountInfo, LookupFailure> {
            Err(LookupFailure::NoneMapped)
        }

        fn create_well_known(
            &self,
            _kind: WellKnownSid,
            _sid: &mut [u8],
        ) -> Result<usize, LookupFailure> {
            Err(LookupFailure::Os(87))
        }
    }

    #[test]
    fn well_known_failure_surfaces() {
        let resolver = LookupResolver::new(NoWellKnown);
        assert_eq!(
            resolver.resolve("ghost").unwrap_err(),
            IdentityError::WellKnown {
                kind: WellKnownSid::Null,
                status: 87
            }
        );
    }
}
