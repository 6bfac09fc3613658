//! crates/logging/src/tracing_bridge.rs
//! Installs the process-wide tracing subscriber.
//!
//! The daemon logs through the standard `tracing` macros. This module turns a
//! [`VerbosityConfig`] into an `EnvFilter` and installs a formatting
//! subscriber writing to stderr. `RUST_LOG`, when set, takes precedence over
//! the verbosity derived from the command line.

use std::error::Error;

use tracing_subscriber::EnvFilter;

use super::config::VerbosityConfig;

/// Builds the filter for `config`, preferring `RUST_LOG` when it parses.
#[must_use]
pub fn build_filter(config: &VerbosityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.filter_directives()))
}

/// Installs a global fmt subscriber filtered by `config`.
///
/// Fails when a global subscriber is already installed.
pub fn init_tracing(config: &VerbosityConfig) -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(config))
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .try_init()
}
