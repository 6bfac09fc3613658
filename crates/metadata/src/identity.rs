//! crates/metadata/src/identity.rs

use std::fmt;

use super::sid::{Sid, SidError};

/// A resolved local identity: the opaque bytes of a security identifier.
///
/// The value owns its buffer. It is released when the identity is dropped,
/// which happens either after the reply has copied it or when the upcall that
/// produced it fails.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    bytes: Box<[u8]>,
}

impl Identity {
    /// Wraps bytes produced by an account lookup.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Box<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Encodes `sid` into a new identity.
    #[must_use]
    pub fn from_sid(sid: &Sid) -> Self {
        Self::from_bytes(sid.to_bytes())
    }

    /// Length of the identity in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the identity carries no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The identity bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Decodes the bytes as a [`Sid`].
    pub fn to_sid(&self) -> Result<Sid, SidError> {
        Sid::from_bytes(&self.bytes)
    }
}

impl AsRef<[u8]> for Identity {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_sid() {
            Ok(sid) => f.debug_tuple("Identity").field(&format_args!("{sid}")).finish(),
            Err(_) => f
                .debug_struct("Identity")
                .field("len", &self.len())
                .finish_non_exhaustive(),
        }
    }
}
