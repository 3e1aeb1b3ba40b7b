//! Session registry
//!
//! Process-wide table of live relay sessions keyed by connection id. It is
//! the only state shared between sessions. Entries are inserted when a
//! session passes the credential check and removed exactly once on teardown.

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

/// Identifier of one accepted downstream connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Registry entry for a live session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub peer: Option<IpAddr>,
    pub created_at: Instant,
    cancel: CancellationToken,
}

impl SessionHandle {
    pub fn new(peer: Option<IpAddr>, cancel: CancellationToken) -> Self {
        Self {
            peer,
            created_at: Instant::now(),
            cancel,
        }
    }

    /// Ask the owning session to tear down.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// Concurrent map of live sessions. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<ConnectionId, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session. Returns false if the id is already taken.
    pub fn insert(&self, id: ConnectionId, handle: SessionHandle) -> bool {
        match self.sessions.entry(id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(handle);
                true
            }
        }
    }

    /// Remove a session. Returns false if it was already gone.
    pub fn remove(&self, id: &ConnectionId) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Cancel every live session. Sessions deregister themselves as they
    /// finish tearing down.
    pub fn shutdown_all(&self) -> usize {
        let handles: Vec<SessionHandle> = self
            .sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        for handle in &handles {
            handle.cancel();
        }

        if !handles.is_empty() {
            info!("Cancelled {} active relay session(s)", handles.len());
        }
        handles.len()
    }
}
