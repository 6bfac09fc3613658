#![deny(unsafe_code)]
#![deny(missing_docs)]

//! # Overview
//!
//! `upcalld` is the entry point embedders call to run the upcall daemon.
//! The crate re-exports the workspace crates and provides [`run_with`], which
//! parses the daemon's command line, installs logging, and serves framed
//! upcalls from a reader until the driver closes it.
//!
//! The remote filesystem client and the table of open handles belong to the
//! embedder and are passed in through [`Host`].
//!
//! # Examples
//!
//! ```
//! use std::io::Cursor;
//! use std::process::ExitCode;
//! use std::sync::Arc;
//!
//! use upcalld::daemon::{FileAttributes, FileId, HandleTable, RemoteAttributeSource, RemoteStatus, SessionId};
//! use upcalld::protocol::{acl::AclContainer, attr::AttrBitmap};
//!
//! struct Offline;
//!
//! impl RemoteAttributeSource for Offline {
//!     fn getattr(
//!         &self,
//!         _: SessionId,
//!         _: &FileId,
//!         _: &AttrBitmap,
//!         _: Option<&mut AclContainer>,
//!     ) -> Result<FileAttributes, RemoteStatus> {
//!         Err(RemoteStatus(5))
//!     }
//! }
//!
//! let host = upcalld::Host::new(
//!     Arc::new(HandleTable::new()),
//!     Arc::new(Offline),
//!     Cursor::new(Vec::new()),
//!     Vec::new(),
//! );
//! let (mut stdout, mut stderr) = (Vec::new(), Vec::new());
//! let exit = upcalld::run_with(["upcalld", "--workers", "2"], host, &mut stdout, &mut stderr);
//! assert_eq!(exit, ExitCode::SUCCESS);
//! ```

use std::ffi::OsString;
use std::fmt;
use std::io::{Read, Write};
use std::process::ExitCode;
use std::sync::Arc;

pub use daemon;
pub use logging;
pub use metadata;
pub use protocol;

use daemon::{
    HandleTable, PoolStats, RemoteAttributeSource, RuntimeOptions, StreamTransport,
    UpcallWorkerPool, getacl_dispatcher,
};
use metadata::{LookupResolver, PlatformAccountLookup};

/// Exit status for command-line errors.
const EXIT_USAGE: u8 = 2;
/// Exit status when serving stops on an I/O error.
const EXIT_IO: u8 = 1;

/// What the embedder supplies to a daemon run.
pub struct Host<R, W> {
    handles: Arc<HandleTable>,
    source: Arc<dyn RemoteAttributeSource>,
    input: R,
    output: W,
}

impl<R, W> Host<R, W> {
    /// Bundles the handle table, the remote client and the upcall channel.
    ///
    /// `input` yields length-prefixed requests and `output` receives
    /// length-prefixed replies.
    pub fn new(
        handles: Arc<HandleTable>,
        source: Arc<dyn RemoteAttributeSource>,
        input: R,
        output: W,
    ) -> Self {
        Self {
            handles,
            source,
            input,
            output,
        }
    }
}

impl<R, W> fmt::Debug for Host<R, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("handles", &self.handles.len())
            .finish_non_exhaustive()
    }
}

/// Runs the daemon with `args` until the upcall channel closes.
///
/// `--help` and `--version` are written to `stdout`; usage and I/O errors to
/// `stderr`.
#[must_use]
pub fn run_with<I, S, R, W, O, E>(
    args: I,
    host: Host<R, W>,
    stdout: &mut O,
    stderr: &mut E,
) -> ExitCode
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    R: Read + Send + 'static,
    W: Write + Send + 'static,
    O: Write,
    E: Write,
{
    let options = match RuntimeOptions::parse(args) {
        Ok(options) => options,
        Err(err) => {
            let _ = write!(stderr, "{err}");
            return ExitCode::from(EXIT_USAGE);
        }
    };
    if options.show_help() {
        let _ = write!(stdout, "{}", RuntimeOptions::help_text());
        return ExitCode::SUCCESS;
    }
    if options.show_version() {
        let _ = write!(stdout, "{}", RuntimeOptions::version_text());
        return ExitCode::SUCCESS;
    }

    match serve(options, host) {
        Ok(stats) => {
            tracing::info!(target: "upcalld::upcall", ?stats, "daemon stopped");
            ExitCode::SUCCESS
        }
        Err(err) => {
            let _ = writeln!(stderr, "upcalld: {err}");
            ExitCode::from(EXIT_IO)
        }
    }
}

fn serve<R, W>(options: RuntimeOptions, host: Host<R, W>) -> std::io::Result<PoolStats>
where
    R: Read + Send + 'static,
    W: Write + Send + 'static,
{
    let config = options.into_config();
    // A subscriber installed by the embedder takes precedence.
    if logging::init_tracing(config.verbosity()).is_err() {
        tracing::debug!(target: "upcalld::upcall", "tracing subscriber already installed");
    }

    let resolver =
        LookupResolver::new(PlatformAccountLookup::new()).with_unmapped(config.unmapped());
    let dispatcher = Arc::new(getacl_dispatcher(
        host.handles,
        host.source,
        Arc::new(resolver),
    ));
    let transport = Arc::new(StreamTransport::new(
        host.input,
        host.output,
        config.max_request(),
    ));
    UpcallWorkerPool::serve(&config, dispatcher, transport)
}
