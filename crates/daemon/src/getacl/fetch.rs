//! Attribute fetch for GETACL.

use std::sync::Arc;

use logging::trace_acl;
use protocol::QueryMask;
use protocol::acl::{AclAllocator, AclContainer, HeapAclAllocator};
use protocol::attr::{AttrBitmap, fattr4};

use crate::error::UpcallError;
use crate::handle_table::OpenState;
use crate::remote::{FileAttributes, RemoteAttributeSource};

/// Attributes fetched for one GETACL, plus the ACL container when DACL was
/// requested. Dropping the value releases the container.
#[derive(Debug)]
pub struct FetchedAttributes {
    /// Owner, group and returned-attribute mask.
    pub attributes: FileAttributes,
    /// The server's ACL; present exactly when DACL was requested.
    pub acl: Option<AclContainer>,
}

/// Builds GETATTR requests from query masks and runs them.
#[derive(Clone)]
pub struct AttributeFetcher {
    source: Arc<dyn RemoteAttributeSource>,
    allocator: Arc<dyn AclAllocator>,
}

impl AttributeFetcher {
    /// Creates a fetcher that allocates ACL containers on the heap.
    pub fn new(source: Arc<dyn RemoteAttributeSource>) -> Self {
        Self {
            source,
            allocator: Arc::new(HeapAclAllocator),
        }
    }

    /// Replaces the ACL container allocator.
    #[must_use]
    pub fn with_allocator(mut self, allocator: Arc<dyn AclAllocator>) -> Self {
        self.allocator = allocator;
        self
    }

    /// The GETATTR bitmap for `query`: the default attribute set, plus `acl`
    /// when DACL is requested.
    #[must_use]
    pub fn request_for(query: QueryMask) -> AttrBitmap {
        let request = AttrBitmap::getattr_defaults();
        if query.contains(QueryMask::DACL) {
            request.with(fattr4::ACL)
        } else {
            request
        }
    }

    /// Fetches the attributes `query` needs for the file behind `state`.
    ///
    /// On failure any allocated container is released before returning.
    pub fn fetch(
        &self,
        state: &OpenState,
        query: QueryMask,
    ) -> Result<FetchedAttributes, UpcallError> {
        let request = Self::request_for(query);
        let mut acl = query
            .contains(QueryMask::DACL)
            .then(|| self.allocator.allocate());
        trace_acl!(
            session = %state.session,
            fileid = state.file.fileid,
            request = %request,
            "fetching attributes"
        );

        let attributes = self
            .source
            .getattr(state.session, &state.file, &request, acl.as_mut())
            .map_err(|err| {
                tracing::error!(
                    target: "upcalld::acl",
                    path = %state.path,
                    status = err.0,
                    "remote getattr failed"
                );
                UpcallError::AttributeFetch(err.0)
            })?;

        Ok(FetchedAttributes { attributes, acl })
    }
}

impl std::fmt::Debug for AttributeFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeFetcher").finish_non_exhaustive()
    }
}
