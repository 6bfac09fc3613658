//! Shared test doubles for the upcalld workspace.
//!
//! - [`ScriptedAccountLookup`] is an in-memory account database that follows
//!   the size-probe contract and records every call.
//! - [`TrackingAclAllocator`] hands out ACL containers whose release is
//!   counted, so tests can prove a container is freed exactly once.
//! - [`ScriptedResolver`] returns canned identities per name.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use metadata::{
    AccountInfo, AccountKind, AccountLookup, Identity, IdentityError, IdentityResolver,
    LookupFailure, WellKnownSid,
};
use protocol::acl::{AclAllocator, AclContainer};

/// One recorded call to [`ScriptedAccountLookup::lookup_account`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LookupCall {
    /// Account name passed in.
    pub account: String,
    /// Capacity of the SID buffer.
    pub sid_capacity: usize,
    /// Capacity of the domain buffer.
    pub domain_capacity: usize,
}

#[derive(Clone, Debug)]
enum Entry {
    Account { sid: Vec<u8>, domain: Vec<u8> },
    Fails(u32),
    FailsOnRetry { sid_len: usize, status: u32 },
}

/// In-memory [`AccountLookup`].
///
/// Unknown names report none-mapped. Entries can be scripted to fail during
/// the probe or only during the sized retry.
#[derive(Debug, Default)]
pub struct ScriptedAccountLookup {
    entries: HashMap<String, Entry>,
    calls: Mutex<Vec<LookupCall>>,
}

impl ScriptedAccountLookup {
    /// Creates an empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `account` with raw SID bytes and a domain name.
    #[must_use]
    pub fn with_account(mut self, account: &str, sid: &[u8], domain: &str) -> Self {
        self.entries.insert(
            account.to_owned(),
            Entry::Account {
                sid: sid.to_vec(),
                domain: domain.as_bytes().to_vec(),
            },
        );
        self
    }

    /// Makes the probe for `account` fail with `status`.
    #[must_use]
    pub fn with_failure(mut self, account: &str, status: u32) -> Self {
        self.entries.insert(account.to_owned(), Entry::Fails(status));
        self
    }

    /// Makes the probe for `account` succeed with a size of `sid_len` and the
    /// sized retry fail with `status`.
    #[must_use]
    pub fn with_retry_failure(mut self, account: &str, sid_len: usize, status: u32) -> Self {
        self.entries
            .insert(account.to_owned(), Entry::FailsOnRetry { sid_len, status });
        self
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<LookupCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AccountLookup for ScriptedAccountLookup {
    fn lookup_account(
        &self,
        account: &str,
        sid: &mut [u8],
        domain: &mut [u8],
    ) -> Result<AccountInfo, LookupFailure> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(LookupCall {
                account: account.to_owned(),
                sid_capacity: sid.len(),
                domain_capacity: domain.len(),
            });

        match self.entries.get(account) {
            None => Err(LookupFailure::NoneMapped),
            Some(Entry::Fails(status)) => Err(LookupFailure::Os(*status)),
            Some(Entry::FailsOnRetry { sid_len, status }) => {
                if sid.len() < *sid_len {
                    Err(LookupFailure::InsufficientBuffer {
                        sid_len: *sid_len,
                        domain_len: 0,
                    })
                } else {
                    Err(LookupFailure::Os(*status))
                }
            }
            Some(Entry::Account {
                sid: bytes,
                domain: name,
            }) => {
                if sid.len() < bytes.len() || domain.len() < name.len() {
                    return Err(LookupFailure::InsufficientBuffer {
                        sid_len: bytes.len(),
                        domain_len: name.len(),
                    });
                }
                sid[..bytes.len()].copy_from_slice(bytes);
                domain[..name.len()].copy_from_slice(name);
                Ok(AccountInfo {
                    sid_len: bytes.len(),
                    domain_len: name.len(),
                    kind: AccountKind::User,
                })
            }
        }
    }
}

/// [`IdentityResolver`] answering from a fixed table of full principal names.
///
/// Names missing from the table resolve to the null SID; names scripted with
/// [`fail`](Self::fail) return a lookup error.
#[derive(Debug, Default)]
pub struct ScriptedResolver {
    identities: HashMap<String, Result<Identity, IdentityError>>,
    resolved: Mutex<Vec<String>>,
}

impl ScriptedResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `name` to `identity`.
    #[must_use]
    pub fn map(mut self, name: &str, identity: Identity) -> Self {
        self.identities.insert(name.to_owned(), Ok(identity));
        self
    }

    /// Maps `name` to an identity of `len` bytes filled with `fill`.
    #[must_use]
    pub fn map_len(self, name: &str, len: usize, fill: u8) -> Self {
        self.map(name, Identity::from_bytes(vec![fill; len]))
    }

    /// Makes resolution of `name` fail with `status`.
    #[must_use]
    pub fn fail(mut self, name: &str, status: u32) -> Self {
        let account = name.split_once('@').map_or(name, |(account, _)| account);
        self.identities.insert(
            name.to_owned(),
            Err(IdentityError::Lookup {
                account: account.to_owned(),
                status,
            }),
        );
        self
    }

    /// Names resolved so far, in order.
    pub fn resolved(&self) -> Vec<String> {
        self.resolved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl IdentityResolver for ScriptedResolver {
    fn resolve(&self, name: &str) -> Result<Identity, IdentityError> {
        self.resolved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(name.to_owned());
        self.identities
            .get(name)
            .cloned()
            .unwrap_or_else(|| Ok(Identity::from_sid(&WellKnownSid::Null.sid())))
    }
}

/// Allocation counters shared between a [`TrackingAclAllocator`] and its
/// containers.
#[derive(Debug, Default)]
pub struct AclCounters {
    allocated: AtomicUsize,
    released: AtomicUsize,
}

impl AclCounters {
    /// Containers handed out.
    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::SeqCst)
    }

    /// Containers dropped.
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Containers handed out but not yet dropped.
    pub fn live(&self) -> usize {
        self.allocated() - self.released()
    }
}

/// [`AclAllocator`] that counts allocations and releases.
#[derive(Clone, Debug, Default)]
pub struct TrackingAclAllocator {
    counters: Arc<AclCounters>,
}

impl TrackingAclAllocator {
    /// Creates an allocator with zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The counters, shared with every container this allocator produced.
    pub fn counters(&self) -> Arc<AclCounters> {
        Arc::clone(&self.counters)
    }
}

impl AclAllocator for TrackingAclAllocator {
    fn allocate(&self) -> AclContainer {
        self.counters.allocated.fetch_add(1, Ordering::SeqCst);
        let counters = Arc::clone(&self.counters);
        AclContainer::with_release_hook(move || {
            counters.released.fetch_add(1, Ordering::SeqCst);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracking_allocator_counts_release() {
        let allocator = TrackingAclAllocator::new();
        let counters = allocator.counters();
        let container = allocator.allocate();
        assert_eq!(counters.live(), 1);
        drop(container);
        assert_eq!(counters.allocated(), 1);
        assert_eq!(counters.released(), 1);
    }

    #[test]
    fn scripted_lookup_follows_probe_contract() {
        let lookup = ScriptedAccountLookup::new().with_account("alice", &[1; 12], "DOM");
        assert_eq!(
            lookup.lookup_account("alice", &mut [], &mut []),
            Err(LookupFailure::InsufficientBuffer {
                sid_len: 12,
                domain_len: 3
            })
        );
        let mut sid = [0u8; 12];
        let mut domain = [0u8; 3];
        let info = lookup.lookup_account("alice", &mut sid, &mut domain).unwrap();
        assert_eq!(info.sid_len, 12);
        assert_eq!(&domain, b"DOM");
        assert_eq!(lookup.calls().len(), 2);
    }
}
