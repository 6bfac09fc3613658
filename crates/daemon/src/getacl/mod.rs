//! GETACL: owner and group security identifiers for an open file.
//!
//! # Overview
//!
//! Arguments are `root: token | open_state: token | query: u32`. The handler
//! fetches the file's attributes, maps the owner and group names the query
//! asks for to local identities, and the reply carries one
//! `length: u32 | sid` record for each, owner first.
//!
//! # Invariants
//!
//! - The root reference is acquired before the open-state token is read; a
//!   parse failure after that point releases it.
//! - An ACL container exists exactly when DACL is requested and is released
//!   once, on every path.
//! - Identities are owned by the arguments until the marshaller consumes
//!   them. A failed group lookup releases an already resolved owner.
//! - DACL and SACL requests are recorded in the log; their ACL bytes are not
//!   part of the reply.

mod fetch;
mod marshal;

use std::sync::Arc;

use logging::{trace_acl, trace_upcall};
use metadata::{Identity, IdentityResolver, PrincipalName};
use protocol::acl::AclAllocator;
use protocol::{HandleToken, Opcode, QueryMask, ReplyWriter, UpcallReader};

use crate::error::UpcallError;
use crate::handle_table::{HandleRef, HandleTable, OpenState, Root};
use crate::op::UpcallOp;
use crate::remote::RemoteAttributeSource;

pub use fetch::{AttributeFetcher, FetchedAttributes};
pub use marshal::marshal_identity;

/// Arguments and results of one GETACL upcall.
#[derive(Debug)]
pub struct GetAclArgs {
    root: HandleRef<Root>,
    state: HandleRef<OpenState>,
    query: QueryMask,
    owner: Option<Identity>,
    group: Option<Identity>,
}

impl GetAclArgs {
    /// The referenced root.
    pub fn root(&self) -> &HandleRef<Root> {
        &self.root
    }

    /// The referenced open state.
    pub fn state(&self) -> &HandleRef<OpenState> {
        &self.state
    }

    /// Requested information.
    pub const fn query(&self) -> QueryMask {
        self.query
    }

    /// Owner identity awaiting marshalling.
    pub const fn owner(&self) -> Option<&Identity> {
        self.owner.as_ref()
    }

    /// Group identity awaiting marshalling.
    pub const fn group(&self) -> Option<&Identity> {
        self.group.as_ref()
    }
}

/// The GETACL operation.
pub struct GetAcl {
    handles: Arc<HandleTable>,
    fetcher: AttributeFetcher,
    resolver: Arc<dyn IdentityResolver>,
}

impl std::fmt::Debug for GetAcl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GetAcl")
            .field("handles", &self.handles.len())
            .field("fetcher", &self.fetcher)
            .finish_non_exhaustive()
    }
}

impl GetAcl {
    /// Creates the operation.
    pub fn new(
        handles: Arc<HandleTable>,
        source: Arc<dyn RemoteAttributeSource>,
        resolver: Arc<dyn IdentityResolver>,
    ) -> Self {
        Self {
            handles,
            fetcher: AttributeFetcher::new(source),
            resolver,
        }
    }

    /// Replaces the allocator used for ACL containers.
    #[must_use]
    pub fn with_allocator(mut self, allocator: Arc<dyn AclAllocator>) -> Self {
        self.fetcher = self.fetcher.with_allocator(allocator);
        self
    }

    fn resolve(&self, role: &'static str, name: &str) -> Result<Identity, UpcallError> {
        let principal = PrincipalName::parse(name);
        trace_acl!(
            role,
            account = principal.account(),
            domain = principal.domain().unwrap_or("<none>"),
            "resolving"
        );
        Ok(self.resolver.resolve(name)?)
    }
}

impl UpcallOp for GetAcl {
    type Args = GetAclArgs;

    fn opcode(&self) -> Opcode {
        Opcode::AclQuery
    }

    fn parse(&self, reader: &mut UpcallReader<'_>) -> Result<GetAclArgs, UpcallError> {
        let root_token = HandleToken::decode(reader)?;
        let root = self.handles.acquire_root(root_token)?;
        let state_token = HandleToken::decode(reader)?;
        let state = self.handles.acquire_open_state(state_token)?;
        let query = QueryMask::decode(reader)?;

        trace_upcall!(
            query = %query,
            root = %root_token,
            open_state = %state_token,
            "parsing ACL_QUERY"
        );
        Ok(GetAclArgs {
            root,
            state,
            query,
            owner: None,
            group: None,
        })
    }

    fn handle(&self, args: &mut GetAclArgs) -> Result<(), UpcallError> {
        let query = args.query;
        let fetched = self.fetcher.fetch(&args.state, query)?;

        let owner = if query.contains(QueryMask::OWNER) {
            Some(self.resolve("owner", &fetched.attributes.owner)?)
        } else {
            None
        };
        let group = if query.contains(QueryMask::GROUP) {
            Some(self.resolve("group", &fetched.attributes.owner_group)?)
        } else {
            None
        };

        if let Some(acl) = &fetched.acl {
            trace_acl!(aces = acl.acl().len(), "DACL requested");
        }
        if query.contains(QueryMask::SACL) {
            trace_acl!("SACL requested");
        }

        args.owner = owner;
        args.group = group;
        Ok(())
    }

    fn marshal(
        &self,
        args: &mut GetAclArgs,
        writer: &mut ReplyWriter<'_>,
    ) -> Result<(), UpcallError> {
        if !args.query.contains(QueryMask::OWNER) && !args.query.contains(QueryMask::GROUP) {
            return Err(UpcallError::NotSupported(Opcode::AclQuery));
        }
        for identity in [args.owner.take(), args.group.take()].into_iter().flatten() {
            let written = marshal_identity(writer, identity)?;
            trace_acl!(written, remaining = writer.remaining(), "identity marshalled");
        }
        Ok(())
    }
}
