//! crates/daemon/src/remote.rs
//!
//! The remote GETATTR the upcall pipeline consumes. The RPC and session layer
//! implementing it lives outside this crate.

use std::sync::Arc;

use protocol::acl::AclContainer;
use protocol::attr::AttrBitmap;
use thiserror::Error;

use crate::handle_table::{FileId, SessionId};

/// Failure status returned by the server or the session layer.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
#[error("remote operation failed with status {0}")]
pub struct RemoteStatus(pub u32);

/// Attributes returned by a GETATTR.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FileAttributes {
    /// `owner` attribute, `name` or `name@domain`.
    pub owner: String,
    /// `owner_group` attribute, `name` or `name@domain`.
    pub owner_group: String,
    /// Attributes the server actually returned.
    pub returned: AttrBitmap,
}

/// Synchronous remote attribute fetch.
pub trait RemoteAttributeSource: Send + Sync {
    /// Fetches the attributes in `request` for `file` over `session`.
    ///
    /// When `request` includes the `acl` attribute the caller passes a
    /// container for the server's ACL.
    fn getattr(
        &self,
        session: SessionId,
        file: &FileId,
        request: &AttrBitmap,
        acl: Option<&mut AclContainer>,
    ) -> Result<FileAttributes, RemoteStatus>;
}

impl<S: RemoteAttributeSource + ?Sized> RemoteAttributeSource for Arc<S> {
    fn getattr(
        &self,
        session: SessionId,
        file: &FileId,
        request: &AttrBitmap,
        acl: Option<&mut AclContainer>,
    ) -> Result<FileAttributes, RemoteStatus> {
        (**self).getattr(session, file, request, acl)
    }
}
