//! Identity and bookkeeping for long-lived connections.
//!
//! HMR sockets outlive the request that opened them, so the server keeps a
//! registry of the ones still open for shutdown logs and metrics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique id for a socket, HMR session or watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new() -> Self {
        // only uniqueness matters
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Open connections and when each one opened. Clones share the registry.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    open: Arc<DashMap<ConnectionId, Instant>>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id` as open until the returned guard drops.
    pub fn track(&self, id: ConnectionId) -> ConnectionGuard {
        self.open.insert(id, Instant::now());
        ConnectionGuard {
            open: Arc::clone(&self.open),
            id,
        }
    }

    pub fn active_count(&self) -> usize {
        self.open.len()
    }

    pub fn is_open(&self, id: ConnectionId) -> bool {
        self.open.contains_key(&id)
    }

    /// How long the oldest open connection has been open.
    pub fn oldest_age(&self) -> Option<Duration> {
        self.open.iter().map(|entry| entry.value().elapsed()).max()
    }
}

/// Removes its connection from the tracker on drop, panics included.
#[derive(Debug)]
pub struct ConnectionGuard {
    open: Arc<DashMap<ConnectionId, Instant>>,
    id: ConnectionId,
}

impl ConnectionGuard {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if let Some((_, opened)) = self.open.remove(&self.id) {
            tracing::trace!(connection_id = %self.id, open_for = ?opened.elapsed(), "Connection closed");
        }
    }
}
