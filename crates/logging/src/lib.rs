#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` gives the daemon one place to decide how noisy it is. Events are
//! emitted with the standard `tracing` macros under a small set of targets,
//! one per [`DebugFlag`] category. A [`VerbosityConfig`] built from the `-v`
//! count (plus optional `category=level` overrides) becomes an `EnvFilter`
//! for the subscriber installed by [`init_tracing`].
//!
//! # Examples
//!
//! ```
//! use logging::{DebugFlag, VerbosityConfig};
//!
//! let mut config = VerbosityConfig::from_verbose_level(1);
//! assert!(config.apply_override("idmap=2"));
//! assert_eq!(config.debug.get(DebugFlag::Idmap), 2);
//! assert!(config.filter_directives().contains("upcalld::idmap=debug"));
//! ```

mod config;
mod levels;
mod tracing_bridge;
mod tracing_macros;

pub use config::VerbosityConfig;
pub use levels::{DebugFlag, DebugLevels};
pub use tracing_bridge::{build_filter, init_tracing};
