#![deny(unsafe_code)]

//! Daemon configuration builders.
//!
//! [`DaemonConfig`] is the immutable configuration handed to the worker pool
//! and the operation registry. [`DaemonConfigBuilder`] assembles it either
//! programmatically or from parsed [`RuntimeOptions`](crate::RuntimeOptions).

use std::num::NonZeroUsize;
use std::thread;

use logging::VerbosityConfig;
use metadata::WellKnownSid;

/// Reply buffer capacity used when none is configured.
pub const DEFAULT_REPLY_BUFFER: usize = 4096;

/// Largest request accepted when none is configured.
pub const DEFAULT_MAX_REQUEST: usize = 64 * 1024;

/// Configuration describing how upcalls are served.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DaemonConfig {
    workers: NonZeroUsize,
    reply_buffer: usize,
    max_request: usize,
    verbosity: VerbosityConfig,
    unmapped: WellKnownSid,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        DaemonConfigBuilder::default().build()
    }
}

impl DaemonConfig {
    /// Creates a new [`DaemonConfigBuilder`].
    #[must_use]
    pub fn builder() -> DaemonConfigBuilder {
        DaemonConfigBuilder::default()
    }

    /// Number of worker threads.
    #[must_use]
    pub const fn workers(&self) -> NonZeroUsize {
        self.workers
    }

    /// Capacity of each worker's reply buffer, envelope included.
    #[must_use]
    pub const fn reply_buffer(&self) -> usize {
        self.reply_buffer
    }

    /// Requests longer than this are rejected without dispatch.
    #[must_use]
    pub const fn max_request(&self) -> usize {
        self.max_request
    }

    /// Logging verbosity.
    #[must_use]
    pub const fn verbosity(&self) -> &VerbosityConfig {
        &self.verbosity
    }

    /// Identity substituted for principal names with no local account.
    #[must_use]
    pub const fn unmapped(&self) -> WellKnownSid {
        self.unmapped
    }
}

/// Builder used to assemble a [`DaemonConfig`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DaemonConfigBuilder {
    workers: Option<NonZeroUsize>,
    reply_buffer: usize,
    max_request: usize,
    verbosity: VerbosityConfig,
    unmapped: WellKnownSid,
}

impl Default for DaemonConfigBuilder {
    fn default() -> Self {
        Self {
            workers: None,
            reply_buffer: DEFAULT_REPLY_BUFFER,
            max_request: DEFAULT_MAX_REQUEST,
            verbosity: VerbosityConfig::default(),
            unmapped: WellKnownSid::Null,
        }
    }
}

impl DaemonConfigBuilder {
    /// Sets the worker count. Defaults to the available parallelism.
    #[must_use]
    pub fn workers(mut self, workers: NonZeroUsize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Sets the reply buffer capacity.
    #[must_use]
    pub fn reply_buffer(mut self, bytes: usize) -> Self {
        self.reply_buffer = bytes;
        self
    }

    /// Sets the maximum request size.
    #[must_use]
    pub fn max_request(mut self, bytes: usize) -> Self {
        self.max_request = bytes;
        self
    }

    /// Sets the logging verbosity.
    #[must_use]
    pub fn verbosity(mut self, verbosity: VerbosityConfig) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Chooses the identity substituted for unmapped names.
    #[must_use]
    pub fn unmapped(mut self, unmapped: WellKnownSid) -> Self {
        self.unmapped = unmapped;
        self
    }

    /// Finalises the builder and constructs the [`DaemonConfig`].
    #[must_use]
    pub fn build(self) -> DaemonConfig {
        let workers = self.workers.unwrap_or_else(|| {
            thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
        });
        DaemonConfig {
            workers,
            reply_buffer: self.reply_buffer,
            max_request: self.max_request,
            verbosity: self.verbosity,
            unmapped: self.unmapped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = DaemonConfig::default();
        assert!(config.workers().get() >= 1);
        assert_eq!(config.reply_buffer(), DEFAULT_REPLY_BUFFER);
        assert_eq!(config.max_request(), DEFAULT_MAX_REQUEST);
        assert_eq!(config.unmapped(), WellKnownSid::Null);
        assert_eq!(config.verbosity(), &VerbosityConfig::default());
    }

    #[test]
    fn builder_overrides() {
        let config = DaemonConfig::builder()
            .workers(NonZeroUsize::new(3).unwrap())
            .reply_buffer(128)
            .max_request(256)
            .unmapped(WellKnownSid::World)
            .verbosity(VerbosityConfig::from_verbose_level(2))
            .build();
        assert_eq!(config.workers().get(), 3);
        assert_eq!(config.reply_buffer(), 128);
        assert_eq!(config.max_request(), 256);
        assert_eq!(config.unmapped(), WellKnownSid::World);
        assert_eq!(config.verbosity().debug.idmap, 2);
    }
}
