//! Command-line options for the upcall daemon.
//!
//! Parsing uses the clap builder API. `--help` and `--version` are plain flags
//! so the caller decides how to render them; [`RuntimeOptions::help_text`]
//! provides the text.

use std::ffi::OsString;
use std::num::NonZeroUsize;

use clap::builder::{NonEmptyStringValueParser, RangedU64ValueParser};
use clap::{Arg, ArgAction, Command};
use logging::VerbosityConfig;
use metadata::WellKnownSid;

use crate::config::{DaemonConfig, DaemonConfigBuilder};

const PROGRAM_NAME: &str = "upcalld";

/// Options parsed from the daemon's command line.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RuntimeOptions {
    workers: Option<NonZeroUsize>,
    reply_buffer: Option<usize>,
    max_request: Option<usize>,
    unmapped: Option<WellKnownSid>,
    verbose: u8,
    debug_overrides: Vec<String>,
    show_help: bool,
    show_version: bool,
}

fn clap_command() -> Command {
    Command::new(PROGRAM_NAME)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg(
            Arg::new("help")
                .long("help")
                .short('h')
                .help("Show this help message and exit.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .short('V')
                .help("Output version information and exit.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("workers")
                .long("workers")
                .value_name("N")
                .help("Number of upcall worker threads.")
                .value_parser(RangedU64ValueParser::<usize>::new().range(1..=1024)),
        )
        .arg(
            Arg::new("reply-buffer")
                .long("reply-buffer")
                .value_name("BYTES")
                .help("Capacity of each reply buffer, envelope included.")
                .value_parser(
                    RangedU64ValueParser::<usize>::new().range(20..=u64::from(u32::MAX)),
                ),
        )
        .arg(
            Arg::new("max-request")
                .long("max-request")
                .value_name("BYTES")
                .help("Reject requests longer than BYTES.")
                .value_parser(RangedU64ValueParser::<usize>::new().range(12..)),
        )
        .arg(
            Arg::new("unmapped")
                .long("unmapped")
                .value_name("KIND")
                .help("Identity reported for names without a local account.")
                .value_parser(["null", "world", "anonymous"]),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Increase logging verbosity; repeat for more detail.")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .value_name("CATEGORY=LEVEL")
                .help("Set one logging category (acl, handle, idmap, upcall).")
                .action(ArgAction::Append)
                .value_parser(NonEmptyStringValueParser::new()),
        )
}

impl RuntimeOptions {
    /// Parses `arguments`, the first of which is the program name.
    pub fn parse<I, S>(arguments: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut args: Vec<OsString> = arguments.into_iter().map(Into::into).collect();
        if args.is_empty() {
            args.push(OsString::from(PROGRAM_NAME));
        }

        let mut command = clap_command();
        let mut matches = command.try_get_matches_from_mut(args)?;

        let unmapped = match matches.remove_one::<String>("unmapped") {
            Some(kind) => Some(kind.parse::<WellKnownSid>().map_err(|err| {
                command.error(clap::error::ErrorKind::InvalidValue, err.to_string())
            })?),
            None => None,
        };

        let debug_overrides: Vec<String> = matches
            .remove_many::<String>("debug")
            .map(Iterator::collect)
            .unwrap_or_default();
        let mut scratch = VerbosityConfig::default();
        if let Some(bad) = debug_overrides
            .iter()
            .find(|directive| !scratch.apply_override(directive))
        {
            return Err(command.error(
                clap::error::ErrorKind::InvalidValue,
                format!("invalid --debug value '{bad}'"),
            ));
        }

        Ok(Self {
            workers: matches
                .remove_one::<usize>("workers")
                .and_then(NonZeroUsize::new),
            reply_buffer: matches.remove_one::<usize>("reply-buffer"),
            max_request: matches.remove_one::<usize>("max-request"),
            unmapped,
            verbose: matches.get_count("verbose"),
            debug_overrides,
            show_help: matches.get_flag("help"),
            show_version: matches.get_flag("version"),
        })
    }

    /// Whether `--help` was given.
    #[must_use]
    pub const fn show_help(&self) -> bool {
        self.show_help
    }

    /// Whether `--version` was given.
    #[must_use]
    pub const fn show_version(&self) -> bool {
        self.show_version
    }

    /// Verbosity from `-v` occurrences and `--debug` overrides.
    #[must_use]
    pub fn verbosity(&self) -> VerbosityConfig {
        let mut config = VerbosityConfig::from_verbose_level(self.verbose);
        for directive in &self.debug_overrides {
            config.apply_override(directive);
        }
        config
    }

    /// Applies the parsed options on top of `builder`.
    #[must_use]
    pub fn apply(&self, mut builder: DaemonConfigBuilder) -> DaemonConfigBuilder {
        if let Some(workers) = self.workers {
            builder = builder.workers(workers);
        }
        if let Some(bytes) = self.reply_buffer {
            builder = builder.reply_buffer(bytes);
        }
        if let Some(bytes) = self.max_request {
            builder = builder.max_request(bytes);
        }
        if let Some(unmapped) = self.unmapped {
            builder = builder.unmapped(unmapped);
        }
        builder.verbosity(self.verbosity())
    }

    /// Builds a [`DaemonConfig`] from defaults and the parsed options.
    #[must_use]
    pub fn into_config(self) -> DaemonConfig {
        self.apply(DaemonConfig::builder()).build()
    }

    /// Rendered `--help` text.
    #[must_use]
    pub fn help_text() -> String {
        clap_command().render_help().to_string()
    }

    /// Rendered `--version` text.
    #[must_use]
    pub fn version_text() -> String {
        format!("{PROGRAM_NAME} {}\n", env!("CARGO_PKG_VERSION"))
    }
}
