//! crates/logging/src/tracing_macros.rs
//! Convenience macros for category-scoped tracing.
//!
//! Each macro forwards to the matching `tracing` macro with the category's
//! target, so filter directives built by
//! [`VerbosityConfig`](crate::VerbosityConfig) select them.

/// Emit an ACL trace.
///
/// # Example
/// ```ignore
/// trace_acl!(query = %mask, "fetching security attributes");
/// ```
#[macro_export]
macro_rules! trace_acl {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "upcalld::acl", $($arg)*)
    };
}

/// Emit an identity mapping trace.
///
/// # Example
/// ```ignore
/// trace_idmap!(account, "mapping principal");
/// ```
#[macro_export]
macro_rules! trace_idmap {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "upcalld::idmap", $($arg)*)
    };
}

/// Emit an upcall dispatch trace.
///
/// # Example
/// ```ignore
/// trace_upcall!(xid, opcode = %op, "dispatching upcall");
/// ```
#[macro_export]
macro_rules! trace_upcall {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "upcalld::upcall", $($arg)*)
    };
}

/// Emit a handle table trace.
///
/// # Example
/// ```ignore
/// trace_handle!(token = %token, refs, "acquired");
/// ```
#[macro_export]
macro_rules! trace_handle {
    ($($arg:tt)*) => {
        ::tracing::trace!(target: "upcalld::handle", $($arg)*)
    };
}
