//! Status codes written into the reply envelope.
//!
//! The driver interprets the status field with the platform's system error
//! numbering, so the daemon reuses those values rather than inventing its own.

/// The upcall completed and the payload is valid.
pub const SUCCESS: u32 = 0;
/// A handle token did not name a live object.
pub const INVALID_HANDLE: u32 = 6;
/// An allocation could not be satisfied.
pub const NOT_ENOUGH_MEMORY: u32 = 8;
/// The opcode is not handled by this daemon.
pub const NOT_SUPPORTED: u32 = 50;
/// The reply did not fit into the reply buffer.
pub const BUFFER_OVERFLOW: u32 = 111;
/// The request buffer ended before a required field.
pub const INSUFFICIENT_BUFFER: u32 = 122;
/// No mapping exists between an account name and a security identifier.
pub const NONE_MAPPED: u32 = 1332;
/// A security identifier is structurally invalid.
pub const INVALID_SID: u32 = 1337;
/// An operation reached a state it should never reach.
pub const INTERNAL_ERROR: u32 = 1359;

/// Symbolic name of a status code, for logs.
#[must_use]
pub const fn name(status: u32) -> &'static str {
    match status {
        SUCCESS => "SUCCESS",
        INVALID_HANDLE => "INVALID_HANDLE",
        NOT_ENOUGH_MEMORY => "NOT_ENOUGH_MEMORY",
        NOT_SUPPORTED => "NOT_SUPPORTED",
        BUFFER_OVERFLOW => "BUFFER_OVERFLOW",
        INSUFFICIENT_BUFFER => "INSUFFICIENT_BUFFER",
        NONE_MAPPED => "NONE_MAPPED",
        INVALID_SID => "INVALID_SID",
        INTERNAL_ERROR => "INTERNAL_ERROR",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_known_codes() {
        assert_eq!(name(BUFFER_OVERFLOW), "BUFFER_OVERFLOW");
        assert_eq!(name(NONE_MAPPED), "NONE_MAPPED");
        assert_eq!(name(424_242), "UNKNOWN");
    }
}
