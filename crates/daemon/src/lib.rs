#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `daemon` hosts the request side of the upcall daemon. A kernel driver
//! hands the daemon a bounded request buffer; the daemon decodes the
//! envelope, runs the operation registered for the opcode and writes a
//! status plus payload into a caller-supplied reply buffer of fixed size.
//!
//! The only operation implemented here is [`GetAcl`], which fetches the
//! owner, owning group and ACL attributes of an open file from the remote
//! server and answers with the owner and group as length-prefixed security
//! identifiers.
//!
//! # Design
//!
//! - [`UpcallOp`] is the parse, handle and marshal triad. Operations are
//!   registered in an [`OpRegistry`] and driven by [`UpcallDispatcher`].
//! - [`HandleTable`] maps the opaque tokens found in requests to shared
//!   root and open-state objects. Acquired references are RAII guards, so an
//!   upcall releases them on every exit path.
//! - [`UpcallWorkerPool`] fans requests out to a fixed set of threads, each
//!   owning its reply buffer, and delivers replies through an
//!   [`UpcallTransport`].
//! - [`RuntimeOptions`] parses the command line into a [`DaemonConfig`].
//!
//! # Invariants
//!
//! - Nothing is written past the end of a reply buffer. A reply that does
//!   not fit fails with `BUFFER_OVERFLOW` and carries no payload.
//! - A failed upcall still produces a reply header with a non-zero status.
//!
//! # Examples
//!
//! Build a dispatcher serving GETACL and feed it an empty request:
//!
//! ```
//! use std::sync::Arc;
//!
//! use daemon::{HandleTable, RemoteAttributeSource, UpcallError};
//! # use daemon::{FileAttributes, FileId, RemoteStatus, SessionId};
//! # use metadata::{Identity, IdentityError, IdentityResolver, WellKnownSid};
//! # use protocol::acl::AclContainer;
//! # use protocol::attr::AttrBitmap;
//! # struct NoServer;
//! # impl RemoteAttributeSource for NoServer {
//! #     fn getattr(&self, _: SessionId, _: &FileId, _: &AttrBitmap, _: Option<&mut AclContainer>)
//! #         -> Result<FileAttributes, RemoteStatus> { Err(RemoteStatus(5)) }
//! # }
//! # struct Null;
//! # impl IdentityResolver for Null {
//! #     fn resolve(&self, _: &str) -> Result<Identity, IdentityError> {
//! #         Ok(Identity::from_sid(&WellKnownSid::Null.sid()))
//! #     }
//! # }
//!
//! let dispatcher = daemon::getacl_dispatcher(
//!     Arc::new(HandleTable::new()),
//!     Arc::new(NoServer),
//!     Arc::new(Null),
//! );
//!
//! let mut reply = [0u8; 64];
//! let err = dispatcher.process(&[], &mut reply).unwrap_err();
//! assert!(matches!(err, UpcallError::Parse(_)));
//! ```

mod config;
mod dispatcher;
mod error;
mod getacl;
mod handle_table;
mod op;
mod remote;
mod runtime_options;
mod transport;
mod worker;

use std::sync::Arc;

use metadata::IdentityResolver;

pub use config::{DEFAULT_MAX_REQUEST, DEFAULT_REPLY_BUFFER, DaemonConfig, DaemonConfigBuilder};
pub use dispatcher::UpcallDispatcher;
pub use error::UpcallError;
pub use getacl::{AttributeFetcher, FetchedAttributes, GetAcl, GetAclArgs, marshal_identity};
pub use handle_table::{FileId, HandleRef, HandleTable, OpenState, Root, SessionId};
pub use op::{OpRegistry, Stage, UpcallOp};
pub use remote::{FileAttributes, RemoteAttributeSource, RemoteStatus};
pub use runtime_options::RuntimeOptions;
pub use transport::{StreamTransport, UpcallTransport};
pub use worker::{PoolStats, UpcallWorkerPool};

/// Builds a dispatcher with [`GetAcl`] registered.
pub fn getacl_dispatcher(
    handles: Arc<HandleTable>,
    source: Arc<dyn RemoteAttributeSource>,
    resolver: Arc<dyn IdentityResolver>,
) -> UpcallDispatcher {
    let mut registry = OpRegistry::new();
    registry.register(GetAcl::new(handles, source, resolver));
    UpcallDispatcher::new(registry)
}
