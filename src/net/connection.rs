//! Connection state machine and lifecycle tracking.
//!
//! # Responsibilities
//! - Track per-connection protocol state
//!   (Listening → ParsingRequest → Dispatching → Responding → Closed)
//! - Generate unique connection IDs for tracing
//! - Count in-flight connections so shutdown can drain them

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::observability::metrics;

/// Global atomic counter for connection IDs.
/// Relaxed ordering is enough: only uniqueness is needed.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
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

/// Protocol state of one connection. Nothing survives past `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Accepted, nothing read yet.
    Listening,
    /// Reading the request line and headers.
    ParsingRequest,
    /// Running the matched handler.
    Dispatching,
    /// Writing the response.
    Responding,
    /// Socket closed.
    Closed,
}

impl ConnectionState {
    /// The state that normally follows this one.
    pub fn successor(self) -> Option<Self> {
        match self {
            Self::Listening => Some(Self::ParsingRequest),
            Self::ParsingRequest => Some(Self::Dispatching),
            Self::Dispatching => Some(Self::Responding),
            Self::Responding => Some(Self::Closed),
            Self::Closed => None,
        }
    }

    /// Forward by one step, or straight to `Closed` from anywhere.
    pub fn can_transition_to(self, next: Self) -> bool {
        (next == Self::Closed && self != Self::Closed) || self.successor() == Some(next)
    }
}

/// State machine for a single connection.
#[derive(Debug)]
pub struct ConnectionLifecycle {
    id: ConnectionId,
    state: ConnectionState,
}

impl ConnectionLifecycle {
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            state: ConnectionState::Listening,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Move to `next`. Invalid transitions are ignored and logged.
    pub fn advance(&mut self, next: ConnectionState) {
        if !self.state.can_transition_to(next) {
            tracing::warn!(connection_id = %self.id, from = ?self.state, to = ?next, "Invalid connection state transition");
            return;
        }
        tracing::trace!(connection_id = %self.id, from = ?self.state, to = ?next, "Connection state");
        self.state = next;
    }
}

/// Tracks active connections for graceful shutdown.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    /// Current count of active connections.
    active_count: Arc<AtomicU64>,
}

impl ConnectionTracker {
    /// Create a new connection tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new active connection. Returns a guard that decrements on drop.
    pub fn track(&self) -> ConnectionGuard {
        let active = self.active_count.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::set_active_connections(active);
        ConnectionGuard {
            active_count: Arc::clone(&self.active_count),
            id: ConnectionId::new(),
        }
    }

    /// Get current active connection count.
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Wait until all connections are closed.
    pub async fn wait_for_shutdown(&self) {
        while self.active_count.load(Ordering::SeqCst) > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }
    }
}

/// Guard that tracks a connection's lifetime.
/// Decrements active count when dropped.
#[derive(Debug)]
pub struct ConnectionGuard {
    active_count: Arc<AtomicU64>,
    id: ConnectionId,
}

impl ConnectionGuard {
    /// Get this connection's ID.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let active = self.active_count.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        metrics::set_active_connections(active);
        tracing::trace!(connection_id = %self.id, "Connection closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_id_unique() {
        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn connection_tracker_counts() {
        let tracker = ConnectionTracker::new();
        assert_eq!(tracker.active_count(), 0);

        let guard1 = tracker.track();
        assert_eq!(tracker.active_count(), 1);

        let guard2 = tracker.track();
        assert_eq!(tracker.active_count(), 2);
        assert_ne!(guard1.id(), guard2.id());

        drop(guard1);
        assert_eq!(tracker.active_count(), 1);

        drop(guard2);
        assert_eq!(tracker.active_count(), 0);
    }

    #[test]
    fn lifecycle_walks_states_in_order() {
        let mut lifecycle = ConnectionLifecycle::new(ConnectionId::new());
        assert_eq!(lifecycle.state(), ConnectionState::Listening);

        lifecycle.advance(ConnectionState::Dispatching);
        assert_eq!(lifecycle.state(), ConnectionState::Listening);

        for next in [
            ConnectionState::ParsingRequest,
            ConnectionState::Dispatching,
            ConnectionState::Responding,
            ConnectionState::Closed,
        ] {
            lifecycle.advance(next);
            assert_eq!(lifecycle.state(), next);
        }
    }

    #[test]
    fn any_state_may_close_early() {
        assert!(ConnectionState::ParsingRequest.can_transition_to(ConnectionState::Closed));
        assert!(!ConnectionState::Closed.can_transition_to(ConnectionState::Closed));
        assert!(!ConnectionState::Responding.can_transition_to(ConnectionState::Dispatching));
    }

    #[tokio::test]
    async fn wait_returns_once_drained() {
        let tracker = ConnectionTracker::new();
        let guard = tracker.track();
        let waiter = {
            let tracker = tracker.clone();
            tokio::spawn(async move { tracker.wait_for_shutdown().await })
        };
        drop(guard);
        tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
