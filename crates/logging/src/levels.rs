//! crates/logging/src/levels.rs
//! Debug categories and their per-category levels.

/// Diagnostic categories emitted by the daemon.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DebugFlag {
    /// ACL attribute fetches and reply marshalling.
    Acl,
    /// Handle table acquisitions and releases.
    Handle,
    /// Principal name to security identifier mapping.
    Idmap,
    /// Upcall dispatch, parse and reply.
    Upcall,
}

impl DebugFlag {
    /// Every category, in the order used for filter directives.
    pub const ALL: [Self; 4] = [Self::Acl, Self::Handle, Self::Idmap, Self::Upcall];

    /// Tracing target events of this category are emitted under.
    #[must_use]
    pub const fn target(self) -> &'static str {
        match self {
            Self::Acl => "upcalld::acl",
            Self::Handle => "upcalld::handle",
            Self::Idmap => "upcalld::idmap",
            Self::Upcall => "upcalld::upcall",
        }
    }

    /// Parses a category name as accepted on the command line.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "acl" => Some(Self::Acl),
            "handle" => Some(Self::Handle),
            "idmap" => Some(Self::Idmap),
            "upcall" => Some(Self::Upcall),
            _ => None,
        }
    }
}

/// Level for each [`DebugFlag`]. Zero keeps only warnings and errors, one adds
/// informational events, two adds debug events and three or more adds traces.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DebugLevels {
    /// ACL processing level.
    pub acl: u8,
    /// Handle table level.
    pub handle: u8,
    /// Identity mapping level.
    pub idmap: u8,
    /// Upcall dispatch level.
    pub upcall: u8,
}

impl DebugLevels {
    /// Get the level for a specific flag.
    pub fn get(&self, flag: DebugFlag) -> u8 {
        match flag {
            DebugFlag::Acl => self.acl,
            DebugFlag::Handle => self.handle,
            DebugFlag::Idmap => self.idmap,
            DebugFlag::Upcall => self.upcall,
        }
    }

    /// Set the level for a specific flag.
    pub fn set(&mut self, flag: DebugFlag, level: u8) {
        match flag {
            DebugFlag::Acl => self.acl = level,
            DebugFlag::Handle => self.handle = level,
            DebugFlag::Idmap => self.idmap = level,
            DebugFlag::Upcall => self.upcall = level,
        }
    }

    /// Set all flags to the specified level.
    pub fn set_all(&mut self, level: u8) {
        for flag in DebugFlag::ALL {
            self.set(flag, level);
        }
    }
}
