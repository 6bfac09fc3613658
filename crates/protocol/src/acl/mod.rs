//! NFSv4 access control lists as carried by the `acl` file attribute.
//!
//! The daemon only transports ACLs: it asks the server for the `acl`
//! attribute when the driver requests a DACL and keeps the decoded list in an
//! [`AclContainer`] for the lifetime of the upcall. Evaluation and inheritance
//! are left to the server.
//!
//! # Wire Format
//!
//! The attribute is XDR encoded (big-endian words, opaque data padded to a
//! multiple of four bytes):
//!
//! ```text
//! count        : u32
//! For each ACE:
//!   type       : u32
//!   flag       : u32
//!   access_mask: u32
//!   who_len    : u32
//!   who        : who_len bytes, zero padded to 4
//! ```

mod container;
mod xdr;

pub use container::{AclAllocator, AclContainer, HeapAclAllocator};
pub use xdr::AclError;

/// What an entry does when its principal and mask match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AceType {
    /// Grants the masked rights.
    Allow,
    /// Refuses the masked rights.
    Deny,
    /// Logs matching access attempts.
    Audit,
    /// Signals matching access attempts.
    Alarm,
}

impl AceType {
    const WIRE: [Self; 4] = [Self::Allow, Self::Deny, Self::Audit, Self::Alarm];

    /// Looks up the entry type carried in the `type` word.
    #[must_use]
    pub fn from_wire(word: u32) -> Option<Self> {
        Self::WIRE.get(word as usize).copied()
    }

    /// The `type` word for this entry type.
    #[must_use]
    pub const fn to_wire(self) -> u32 {
        self as u32
    }
}

/// Declares a transparent wrapper around one 32-bit ACE word.
macro_rules! ace_word {
    ($(#[$doc:meta])* $name:ident { $($(#[$bit_doc:meta])* $bit:ident = $value:expr;)* }) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(u32);

        impl $name {
            $($(#[$bit_doc])* pub const $bit: u32 = $value;)*

            /// Wraps the word as read off the wire.
            #[must_use]
            pub const fn from_raw(word: u32) -> Self {
                Self(word)
            }

            /// The word as written to the wire.
            #[must_use]
            pub const fn as_raw(self) -> u32 {
                self.0
            }

            /// Whether every bit of `bits` is set.
            #[must_use]
            pub const fn contains(self, bits: u32) -> bool {
                self.0 & bits == bits
            }
        }
    };
}

ace_word! {
    /// Inheritance and audit flags of an entry.
    AceFlags {
        /// The principal is a group.
        IDENTIFIER_GROUP = 0x0040;
    }
}

ace_word! {
    /// Rights an entry grants, refuses or audits.
    AccessMask {
        /// List a directory or read file data.
        READ_DATA = 0x0001;
        /// Create a file or write file data.
        WRITE_DATA = 0x0002;
        /// Search a directory or execute a file.
        EXECUTE = 0x0020;
        /// Read the `acl` attribute.
        READ_ACL = 0x0002_0000;
    }
}

/// One access control entry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Nfs4Ace {
    /// Effect of a match.
    pub ace_type: AceType,
    /// Inheritance and audit bits.
    pub flags: AceFlags,
    /// Rights covered by the entry.
    pub mask: AccessMask,
    /// `name@domain`, or a special principal such as `OWNER@`.
    pub who: String,
}

/// Entries of the `acl` attribute, kept in server order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Nfs4Acl {
    /// Entries as decoded.
    pub aces: Vec<Nfs4Ace>,
}

impl Nfs4Acl {
    /// An ACL without entries.
    #[must_use]
    pub const fn new() -> Self {
        Self { aces: Vec::new() }
    }

    /// Whether the server returned no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aces.is_empty()
    }

    /// Entry count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.aces.len()
    }
}
