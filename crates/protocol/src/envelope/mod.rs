//! Upcall request and reply envelopes.
//!
//! Every upcall starts with a [`RequestHeader`] naming the transaction and the
//! operation, followed by operation-specific arguments. The daemon answers
//! with a [`ReplyHeader`] carrying the same transaction id, the completion
//! status and the length of the marshalled payload that follows it. The
//! payload is present only when the status is zero.
//!
//! ```text
//! request: xid (u64) | opcode (u32) | arguments...
//! reply:   xid (u64) | opcode (u32) | status (u32) | payload_len (u32) | payload...
//! ```

mod header;
mod opcode;

pub use header::{REPLY_HEADER_LEN, REQUEST_HEADER_LEN, ReplyHeader, RequestHeader};
pub use opcode::{Opcode, UnknownOpcode};

#[cfg(test)]
mod tests;
