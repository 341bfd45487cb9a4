//! Connection identity and lifecycle tracking.
//!
//! # Responsibilities
//! - Generate unique connection IDs for log correlation
//! - Count in-flight handlers for graceful drain at shutdown

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::observability::metrics;

/// Global atomic counter for connection IDs.
/// Relaxed ordering is sufficient since we only need uniqueness.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for one accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    fn next() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Tracks active connections so shutdown can drain them.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active_count: Arc<AtomicU64>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new active connection. Returns a guard that decrements on drop.
    pub fn track(&self) -> ConnectionGuard {
        let count = self.active_count.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::record_active_connections(count);
        ConnectionGuard {
            active_count: Arc::clone(&self.active_count),
            id: ConnectionId::next(),
        }
    }

    /// Current number of in-flight handlers.
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Wait until every tracked connection has finished.
    ///
    /// Callers bound this with a timeout; a hung origin can hold a handler
    /// open indefinitely.
    pub async fn wait_idle(&self) {
        while self.active_count() > 0 {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

/// Guard for one connection's lifetime; decrements the active count on drop.
#[derive(Debug)]
pub struct ConnectionGuard {
    active_count: Arc<AtomicU64>,
    id: ConnectionId,
}

impl ConnectionGuard {
    /// This connection's ID.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let count = self.active_count.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::record_active_connections(count);
        tracing::trace!(connection_id = %self.id, "Connection closed");
    }
}
