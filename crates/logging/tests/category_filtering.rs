//! Category macros routed through filters built from verbosity settings.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use logging::{DebugFlag, VerbosityConfig, trace_acl, trace_handle, trace_idmap, trace_upcall};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn emit_all(config: &VerbosityConfig) -> String {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.filter_directives()))
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        trace_upcall!(xid = 7u64, "upcall event");
        trace_idmap!(account = "alice", "idmap event");
        trace_acl!(aces = 2usize, "acl event");
        trace_handle!(refs = 1usize, "handle event");
        tracing::warn!(target: "upcalld::upcall", "warning event");
    });
    captured.text()
}

#[test]
fn quiet_keeps_only_warnings() {
    let out = emit_all(&VerbosityConfig::from_verbose_level(0));
    assert!(out.contains("warning event"));
    for hidden in ["upcall event", "idmap event", "acl event", "handle event"] {
        assert!(!out.contains(hidden), "{hidden} leaked into:\n{out}");
    }
}

#[test]
fn double_verbose_shows_debug_categories_but_not_handles() {
    let out = emit_all(&VerbosityConfig::from_verbose_level(2));
    for shown in ["upcall event", "idmap event", "acl event", "warning event"] {
        assert!(out.contains(shown), "{shown} missing from:\n{out}");
    }
    assert!(!out.contains("handle event"));
    assert!(out.contains("upcalld::idmap"));
}

#[test]
fn override_enables_a_single_category() {
    let mut config = VerbosityConfig::default();
    assert!(config.apply_override("handle=3"));
    assert_eq!(config.debug.get(DebugFlag::Handle), 3);

    let out = emit_all(&config);
    assert!(out.contains("handle event"));
    assert!(!out.contains("acl event"));
}

#[test]
fn malformed_overrides_leave_config_untouched() {
    let mut config = VerbosityConfig::from_verbose_level(1);
    let before = config.clone();
    for bad in ["", "acl", "acl=", "acl=high", "nope=1", "=2"] {
        assert!(!config.apply_override(bad), "{bad:?} accepted");
    }
    assert_eq!(config, before);
}

#[cfg(feature = "serde")]
#[test]
fn verbosity_serializes_per_category() {
    let config = VerbosityConfig::from_verbose_level(2);
    let json = serde_json::to_value(&config).unwrap();
    assert_eq!(json["debug"]["idmap"], 2);
    assert_eq!(json["debug"]["handle"], 1);
    let back: VerbosityConfig = serde_json::from_value(json).unwrap();
    assert_eq!(back, config);
}
