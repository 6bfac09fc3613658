#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(missing_docs)]

//! Wire-level building blocks for the upcall daemon.
//!
//! The kernel driver and the daemon exchange upcalls through a fixed-size,
//! in-process buffer. This crate owns every byte-level concern of that
//! exchange so that operation handlers never index raw memory:
//!
//! - [`UpcallReader`] and [`ReplyWriter`] are bounded cursors. Every field is
//!   length-checked before it is read or written and failures surface as
//!   [`CodecError`] values.
//! - [`HandleToken`] and [`QueryMask`] are the fixed-size fields that appear in
//!   request arguments.
//! - [`envelope`] describes the request and reply headers shared by every
//!   operation.
//! - [`attr`] and [`acl`] model the NFSv4 attribute bitmap and the `acl`
//!   attribute returned by the server.
//! - [`status`] lists the status codes reported back to the driver.
//!
//! # Examples
//!
//! Decode a request that carries two handle tokens and a query mask:
//!
//! ```
//! use protocol::{HandleToken, QueryMask, UpcallReader};
//!
//! let mut request = Vec::new();
//! request.extend_from_slice(&HandleToken::from_raw(1).to_wire());
//! request.extend_from_slice(&HandleToken::from_raw(2).to_wire());
//! request.extend_from_slice(&0x3u32.to_ne_bytes());
//!
//! let mut reader = UpcallReader::new(&request);
//! let root = HandleToken::decode(&mut reader)?;
//! let state = HandleToken::decode(&mut reader)?;
//! let query = QueryMask::decode(&mut reader)?;
//!
//! assert_eq!(root.as_raw(), 1);
//! assert_eq!(state.as_raw(), 2);
//! assert_eq!(query, QueryMask::OWNER | QueryMask::GROUP);
//! # Ok::<(), protocol::CodecError>(())
//! ```

pub mod acl;
pub mod attr;
mod cursor;
pub mod envelope;
mod error;
mod handle;
mod query;
pub mod status;

pub use cursor::{ReplyWriter, UpcallReader};
pub use envelope::{Opcode, ReplyHeader, RequestHeader};
pub use error::CodecError;
pub use handle::HandleToken;
pub use query::QueryMask;
