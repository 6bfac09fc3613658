use std::fmt;

use super::Nfs4Acl;

type ReleaseHook = Box<dyn FnOnce() + Send>;

/// Owned, per-upcall storage for the ACL returned by a GETATTR.
///
/// A container starts empty and is filled by the attribute fetch. It is
/// released exactly once: when it is dropped, whichever exit path the upcall
/// takes. An optional release hook runs at that point, which lets allocators
/// account for outstanding containers.
pub struct AclContainer {
    acl: Nfs4Acl,
    on_release: Option<ReleaseHook>,
}

impl AclContainer {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            acl: Nfs4Acl::new(),
            on_release: None,
        }
    }

    /// Creates an empty container that calls `hook` when released.
    #[must_use]
    pub fn with_release_hook<F>(hook: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            acl: Nfs4Acl::new(),
            on_release: Some(Box::new(hook)),
        }
    }

    /// Borrows the stored ACL.
    #[must_use]
    pub const fn acl(&self) -> &Nfs4Acl {
        &self.acl
    }

    /// Replaces the stored ACL.
    pub fn set_acl(&mut self, acl: Nfs4Acl) {
        self.acl = acl;
    }
}

impl Default for AclContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AclContainer {
    fn drop(&mut self) {
        if let Some(hook) = self.on_release.take() {
            hook();
        }
    }
}

impl fmt::Debug for AclContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AclContainer")
            .field("acl", &self.acl)
            .field("tracked", &self.on_release.is_some())
            .finish()
    }
}

/// Source of [`AclContainer`] values for attribute fetches.
pub trait AclAllocator: Send + Sync {
    /// Returns a fresh, empty container.
    fn allocate(&self) -> AclContainer;
}

/// Allocator that hands out plain heap containers.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeapAclAllocator;

impl AclAllocator for HeapAclAllocator {
    fn allocate(&self) -> AclContainer {
        AclContainer::new()
    }
}
