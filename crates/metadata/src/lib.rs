#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(missing_docs)]

//! # Overview
//!
//! `metadata` turns the owner and group names an NFSv4 server reports into
//! local security identifiers. Names arrive as `account` or
//! `account@domain`; [`PrincipalName`] splits them and the account part is
//! looked up in a local or directory account database.
//!
//! # Design
//!
//! - [`Sid`] models a security identifier and its binary encoding.
//! - [`Identity`] owns the encoded bytes handed back to the driver.
//! - [`AccountLookup`] is the backend primitive. It follows a size-probe
//!   contract: a call with empty buffers reports the sizes the real call needs.
//!   [`NssAccountLookup`] serves Unix hosts and `WindowsAccountLookup` serves
//!   Windows.
//! - [`IdentityResolver`] is what the daemon consumes. [`LookupResolver`]
//!   implements it on top of any [`AccountLookup`], hiding the two phases and
//!   substituting a [`WellKnownSid`] for names no database knows.
//!
//! # Examples
//!
//! ```
//! use metadata::{PrincipalName, Sid, WellKnownSid};
//!
//! let name = PrincipalName::parse("alice@example.com");
//! assert_eq!(name.account(), "alice");
//! assert_eq!(name.domain(), Some("example.com"));
//!
//! assert_eq!(WellKnownSid::Null.sid().to_string(), "S-1-0-0");
//! assert_eq!(Sid::unix_user(1000).to_string(), "S-1-22-1-1000");
//! ```

mod error;
mod identity;
mod lookup;
#[cfg(unix)]
mod nss;
mod principal;
mod resolver;
mod sid;
#[cfg(windows)]
mod win32;

pub use error::IdentityError;
pub use identity::Identity;
pub use lookup::{AccountInfo, AccountKind, AccountLookup, LookupFailure};
#[cfg(unix)]
pub use nss::NssAccountLookup;
pub use principal::PrincipalName;
pub use resolver::{IdentityResolver, LookupResolver};
pub use sid::{
    SID_HEADER_LEN, SID_MAX_LEN, SID_MAX_SUB_AUTHORITIES, SID_REVISION, Sid, SidError,
    UNIX_AUTHORITY, UnknownWellKnownSid, WellKnownSid,
};
#[cfg(windows)]
pub use win32::WindowsAccountLookup;

/// The account database native to the host platform.
#[cfg(unix)]
pub type PlatformAccountLookup = NssAccountLookup;

/// The account database native to the host platform.
#[cfg(windows)]
pub type PlatformAccountLookup = WindowsAccountLookup;
