//! crates/daemon/src/handle_table.rs
//!
//! Reference-counted registry of the objects upcalls refer to by token.
//!
//! The driver names mounted roots and open files through opaque
//! [`HandleToken`]s. Parsing an upcall acquires a reference on each named
//! object and the returned [`HandleRef`] guard releases it when dropped, which
//! is the upcall's completion point. The table uses DashMap so concurrent
//! workers can acquire and release without contending on a single lock.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use dashmap::DashMap;
use logging::trace_handle;
use protocol::HandleToken;

use crate::error::UpcallError;

/// Identifier of an RPC session with the server.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct SessionId(u64);

impl SessionId {
    /// Wraps a raw session identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the numeric value of this session ID.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Remote identity of a file: its NFSv4 file handle and fileid.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct FileId {
    /// Opaque `nfs_fh4` bytes.
    pub handle: Vec<u8>,
    /// Server-assigned `fileid` attribute.
    pub fileid: u64,
}

/// A mounted filesystem root.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Root {
    /// Session the root was mounted over.
    pub session: SessionId,
    /// Server the root belongs to, for diagnostics.
    pub server: String,
}

/// Per-open-file state.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OpenState {
    /// Session used for requests against this file.
    pub session: SessionId,
    /// The file the state refers to.
    pub file: FileId,
    /// Path relative to the root, for diagnostics.
    pub path: String,
}

#[derive(Debug, Default)]
struct RefCounts {
    live: AtomicUsize,
    acquisitions: AtomicUsize,
}

#[derive(Debug)]
struct Entry<T> {
    object: Arc<T>,
    counts: Arc<RefCounts>,
}

/// A counted reference to a table object, released on drop.
pub struct HandleRef<T> {
    token: HandleToken,
    object: Arc<T>,
    counts: Arc<RefCounts>,
}

impl<T> HandleRef<T> {
    /// Token this reference was acquired through.
    #[must_use]
    pub const fn token(&self) -> HandleToken {
        self.token
    }
}

impl<T> Deref for HandleRef<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.object
    }
}

impl<T> Drop for HandleRef<T> {
    fn drop(&mut self) {
        let previous = self.counts.live.fetch_sub(1, Ordering::AcqRel);
        trace_handle!(token = %self.token, refs = previous - 1, "released");
    }
}

impl<T: fmt::Debug> fmt::Debug for HandleRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleRef")
            .field("token", &self.token)
            .field("object", &self.object)
            .finish()
    }
}

/// Concurrent table of roots and open states.
#[derive(Debug)]
pub struct HandleTable {
    roots: DashMap<HandleToken, Entry<Root>>,
    states: DashMap<HandleToken, Entry<OpenState>>,
    next_token: AtomicU64,
}

impl Default for HandleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl HandleTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            roots: DashMap::new(),
            states: DashMap::new(),
            next_token: AtomicU64::new(1),
        }
    }

    fn allocate_token(&self) -> HandleToken {
        HandleToken::from_raw(self.next_token.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers a root and returns its token.
    pub fn insert_root(&self, root: Root) -> HandleToken {
        let token = self.allocate_token();
        self.roots.insert(token, new_entry(root));
        trace_handle!(token = %token, "root registered");
        token
    }

    /// Registers an open state and returns its token.
    pub fn insert_open_state(&self, state: OpenState) -> HandleToken {
        let token = self.allocate_token();
        self.states.insert(token, new_entry(state));
        trace_handle!(token = %token, "open state registered");
        token
    }

    /// Removes a root. Outstanding references keep the object alive.
    pub fn remove_root(&self, token: HandleToken) -> Option<Arc<Root>> {
        self.roots.remove(&token).map(|(_, entry)| entry.object)
    }

    /// Removes an open state. Outstanding references keep the object alive.
    pub fn remove_open_state(&self, token: HandleToken) -> Option<Arc<OpenState>> {
        self.states.remove(&token).map(|(_, entry)| entry.object)
    }

    /// Acquires a reference to the root named by `token`.
    pub fn acquire_root(&self, token: HandleToken) -> Result<HandleRef<Root>, UpcallError> {
        acquire(&self.roots, token)
    }

    /// Acquires a reference to the open state named by `token`.
    pub fn acquire_open_state(
        &self,
        token: HandleToken,
    ) -> Result<HandleRef<OpenState>, UpcallError> {
        acquire(&self.states, token)
    }

    /// Outstanding references to the object named by `token`.
    pub fn ref_count(&self, token: HandleToken) -> Option<usize> {
        self.counts(token)
            .map(|counts| counts.live.load(Ordering::Acquire))
    }

    /// Total acquisitions ever made through `token`.
    pub fn acquisitions(&self, token: HandleToken) -> Option<usize> {
        self.counts(token)
            .map(|counts| counts.acquisitions.load(Ordering::Acquire))
    }

    /// Number of registered objects.
    pub fn len(&self) -> usize {
        self.roots.len() + self.states.len()
    }

    /// Whether no objects are registered.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty() && self.states.is_empty()
    }

    fn counts(&self, token: HandleToken) -> Option<Arc<RefCounts>> {
        if let Some(entry) = self.roots.get(&token) {
            return Some(Arc::clone(&entry.counts));
        }
        self.states
            .get(&token)
            .map(|entry| Arc::clone(&entry.counts))
    }
}

fn new_entry<T>(object: T) -> Entry<T> {
    Entry {
        object: Arc::new(object),
        counts: Arc::new(RefCounts::default()),
    }
}

fn acquire<T>(
    map: &DashMap<HandleToken, Entry<T>>,
    token: HandleToken,
) -> Result<HandleRef<T>, UpcallError> {
    let entry = map.get(&token).ok_or(UpcallError::InvalidHandle(token))?;
    let refs = entry.counts.live.fetch_add(1, Ordering::AcqRel) + 1;
    entry.counts.acquisitions.fetch_add(1, Ordering::AcqRel);
    trace_handle!(token = %token, refs, "acquired");
    Ok(HandleRef {
        token,
        object: Arc::clone(&entry.object),
        counts: Arc::clone(&entry.counts),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn root() -> Root {
        Root {
            session: SessionId::new(7),
            server: "nfs.example.com".into(),
        }
    }

    fn open_state() -> OpenState {
        OpenState {
            session: SessionId::new(7),
            file: FileId {
                handle: vec![0xde, 0xad],
                fileid: 42,
            },
            path: "/export/a.txt".into(),
        }
    }

    #[test]
    fn acquire_and_release_track_counts() {
        let table = HandleTable::new();
        let token = table.insert_root(root());
        assert_eq!(table.ref_count(token), Some(0));

        let first = table.acquire_root(token).unwrap();
        let second = table.acquire_root(token).unwrap();
        assert_eq!(table.ref_count(token), Some(2));
        assert_eq!(first.server, "nfs.example.com");

        drop(first);
        assert_eq!(table.ref_count(token), Some(1));
        drop(second);
        assert_eq!(table.ref_count(token), Some(0));
        assert_eq!(table.acquisitions(token), Some(2));
    }

    #[test]
    fn unknown_token_is_invalid_handle() {
        let table = HandleTable::new();
        let token = HandleToken::from_raw(99);
        assert!(matches!(
            table.acquire_open_state(token),
            Err(UpcallError::InvalidHandle(t)) if t == token
        ));
        assert_eq!(table.ref_count(token), None);
    }

    #[test]
    fn roots_and_states_do_not_alias() {
        let table = HandleTable::new();
        let root_token = table.insert_root(root());
        let state_token = table.insert_open_state(open_state());
        assert_ne!(root_token, state_token);
        assert!(table.acquire_open_state(root_token).is_err());
        assert!(table.acquire_root(state_token).is_err());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn removed_object_outlives_outstanding_reference() {
        let table = HandleTable::new();
        let token = table.insert_open_state(open_state());
        let guard = table.acquire_open_state(token).unwrap();
        assert!(table.remove_open_state(token).is_some());
        assert_eq!(guard.file.fileid, 42);
        assert!(table.acquire_open_state(token).is_err());
        assert!(table.is_empty());
    }

    #[test]
    fn concurrent_acquisitions_balance() {
        let table = Arc::new(HandleTable::new());
        let token = table.insert_open_state(open_state());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let table = Arc::clone(&table);
                thread::spawn(move || {
                    for _ in 0..100 {
                        let guard = table.acquire_open_state(token).unwrap();
                        assert_eq!(guard.token(), token);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(table.ref_count(token), Some(0));
        assert_eq!(table.acquisitions(token), Some(800));
    }
}
