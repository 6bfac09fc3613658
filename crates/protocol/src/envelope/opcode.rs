use std::fmt;

use thiserror::Error;

/// Operation codes understood by the upcall dispatcher.
///
/// The numbering is shared with the driver. Only a subset is serviced by any
/// given daemon build; the dispatcher answers the rest with a not-supported
/// status.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u32)]
pub enum Opcode {
    /// Mount a remote export.
    Mount = 1,
    /// Unmount a remote export.
    Unmount = 2,
    /// Open or create a file.
    Open = 3,
    /// Close an open file.
    Close = 4,
    /// Read file data.
    Read = 5,
    /// Write file data.
    Write = 6,
    /// Acquire a byte-range lock.
    Lock = 7,
    /// Release a byte-range lock.
    Unlock = 8,
    /// Enumerate a directory.
    DirQuery = 9,
    /// Query file information.
    FileQuery = 10,
    /// Set file information.
    FileSet = 11,
    /// Set extended attributes.
    EaSet = 12,
    /// Read or create a symbolic link.
    Symlink = 13,
    /// Query volume information.
    VolumeQuery = 14,
    /// Query owner, group and ACL security information.
    AclQuery = 15,
    /// Update security information.
    AclSet = 16,
    /// Stop servicing upcalls.
    Shutdown = 17,
}

impl Opcode {
    /// Every defined opcode in numeric order.
    pub const ALL: [Self; 17] = [
        Self::Mount,
        Self::Unmount,
        Self::Open,
        Self::Close,
        Self::Read,
        Self::Write,
        Self::Lock,
        Self::Unlock,
        Self::DirQuery,
        Self::FileQuery,
        Self::FileSet,
        Self::EaSet,
        Self::Symlink,
        Self::VolumeQuery,
        Self::AclQuery,
        Self::AclSet,
        Self::Shutdown,
    ];

    /// Returns the numeric code used on the wire.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    /// Returns the canonical upper-case name of the opcode.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mount => "MOUNT",
            Self::Unmount => "UNMOUNT",
            Self::Open => "OPEN",
            Self::Close => "CLOSE",
            Self::Read => "READ",
            Self::Write => "WRITE",
            Self::Lock => "LOCK",
            Self::Unlock => "UNLOCK",
            Self::DirQuery => "DIR_QUERY",
            Self::FileQuery => "FILE_QUERY",
            Self::FileSet => "FILE_SET",
            Self::EaSet => "EA_SET",
            Self::Symlink => "SYMLINK",
            Self::VolumeQuery => "VOLUME_QUERY",
            Self::AclQuery => "ACL_QUERY",
            Self::AclSet => "ACL_SET",
            Self::Shutdown => "SHUTDOWN",
        }
    }
}

/// Error returned when a raw value does not name an [`Opcode`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
#[error("unknown upcall opcode {0}")]
pub struct UnknownOpcode(pub u32);

impl TryFrom<u32> for Opcode {
    type Error = UnknownOpcode;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|opcode| opcode.as_u32() == value)
            .ok_or(UnknownOpcode(value))
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
