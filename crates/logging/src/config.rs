//! crates/logging/src/config.rs
//! Verbosity configuration and its translation into tracing filter directives.

use super::levels::{DebugFlag, DebugLevels};

/// Verbosity configuration for the daemon's diagnostic categories.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VerbosityConfig {
    /// Per-category levels.
    pub debug: DebugLevels,
}

impl VerbosityConfig {
    /// Maps a `-v` count to per-category levels.
    ///
    /// One `-v` reports each upcall, two add identity mapping and ACL detail,
    /// three and more trace everything including handle reference counts.
    pub fn from_verbose_level(level: u8) -> Self {
        let mut config = Self::default();

        match level {
            0 => {}
            1 => {
                config.debug.upcall = 1;
            }
            2 => {
                config.debug.set_all(1);
                config.debug.upcall = 2;
                config.debug.idmap = 2;
                config.debug.acl = 2;
            }
            _ => config.debug.set_all(3),
        }

        config
    }

    /// Applies a `category=level` override such as `idmap=3`.
    ///
    /// Returns `false` when the category or level cannot be parsed.
    pub fn apply_override(&mut self, directive: &str) -> bool {
        let Some((name, level)) = directive.split_once('=') else {
            return false;
        };
        match (DebugFlag::from_name(name), level.trim().parse::<u8>()) {
            (Some(flag), Ok(level)) => {
                self.debug.set(flag, level);
                true
            }
            _ => false,
        }
    }

    /// Renders the configuration as an `EnvFilter` directive string.
    #[must_use]
    pub fn filter_directives(&self) -> String {
        let mut directives = vec!["warn".to_owned()];
        for flag in DebugFlag::ALL {
            let level = self.debug.get(flag);
            if level > 0 {
                directives.push(format!("{}={}", flag.target(), level_name(level)));
            }
        }
        directives.join(",")
    }
}

const fn level_name(level: u8) -> &'static str {
    match level {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_config_keeps_only_warnings() {
        let config = VerbosityConfig::from_verbose_level(0);
        assert_eq!(config.filter_directives(), "warn");
    }

    #[test]
    fn single_verbose_reports_upcalls() {
        let config = VerbosityConfig::from_verbose_level(1);
        assert_eq!(config.debug.upcall, 1);
        assert_eq!(config.debug.idmap, 0);
        assert_eq!(config.filter_directives(), "warn,upcalld::upcall=info");
    }

    #[test]
    fn double_verbose_enables_debug_categories() {
        let config = VerbosityConfig::from_verbose_level(2);
        assert_eq!(
            config.filter_directives(),
            "warn,upcalld::acl=debug,upcalld::handle=info,upcalld::idmap=debug,upcalld::upcall=debug"
        );
    }

    #[test]
    fn high_verbosity_traces_everything() {
        let config = VerbosityConfig::from_verbose_level(7);
        for flag in DebugFlag::ALL {
            assert_eq!(config.debug.get(flag), 3);
        }
    }

    #[test]
    fn override_sets_single_category() {
        let mut config = VerbosityConfig::default();
        assert!(config.apply_override("idmap=2"));
        assert_eq!(config.debug.idmap, 2);
        assert!(!config.apply_override("bogus=1"));
        assert!(!config.apply_override("acl"));
        assert!(!config.apply_override("acl=x"));
    }
}
