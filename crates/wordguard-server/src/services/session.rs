// ============================================
// File: crates/wordguard-server/src/services/session.rs
// ============================================
//! # Connection Registry
//!
//! ## Creation Reason
//! Each connection owns its protocol state inside its own task, but the
//! server still needs a process-wide view: how many connections are open
//! (for `max_connections`), how long each has been idle, and a place to
//! report per-connection counters on close.
//!
//! ## Main Functionality
//! - `ConnectionInfo`: shared, read-mostly view of one connection
//! - `ConnectionState`: lifecycle as seen from outside the task
//! - `SessionManager`: DashMap registry with a connection limit
//!
//! ## Connection Lifecycle
//! ```text
//! accept ──► Handshaking ──(session key)──► Established ──► Closed
//!                 │                                           ▲
//!                 └──────(fatal error / peer close)───────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Nothing protocol-related lives here; keys and game state stay in
//!   the connection task
//! - Always deregister through `SessionManager::remove`
//!
//! ## Last Modified
//! v0.1.0 - Initial connection registry

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, info};

use wordguard_common::time::ActivityClock;
use wordguard_common::types::SessionId;

use crate::error::{Result, ServerError};

// ============================================
// Connection State
// ============================================

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Handshaking,
    Established,
    Closed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Handshaking => write!(f, "Handshaking"),
            Self::Established => write!(f, "Established"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

// ============================================
// Connection Statistics
// ============================================

/// Per-connection counters.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    pub frames_rx: AtomicU64,
    pub frames_tx: AtomicU64,
    pub bytes_rx: AtomicU64,
    pub bytes_tx: AtomicU64,
    pub soft_errors: AtomicU64,
    pub games_finished: AtomicU64,
}

impl ConnectionStats {
    pub fn record_rx(&self, bytes: u64) {
        self.bytes_rx.fetch_add(bytes, Ordering::Relaxed);
        self.frames_rx.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tx(&self, bytes: u64) {
        self.bytes_tx.fetch_add(bytes, Ordering::Relaxed);
        self.frames_tx.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_soft_error(&self) {
        self.soft_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_game_finished(&self) {
        self.games_finished.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames_rx: self.frames_rx.load(Ordering::Relaxed),
            frames_tx: self.frames_tx.load(Ordering::Relaxed),
            bytes_rx: self.bytes_rx.load(Ordering::Relaxed),
            bytes_tx: self.bytes_tx.load(Ordering::Relaxed),
            soft_errors: self.soft_errors.load(Ordering::Relaxed),
            games_finished: self.games_finished.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub frames_rx: u64,
    pub frames_tx: u64,
    pub bytes_rx: u64,
    pub bytes_tx: u64,
    pub soft_errors: u64,
    pub games_finished: u64,
}

// ============================================
// ConnectionInfo
// ============================================

/// Shared view of one live connection.
pub struct ConnectionInfo {
    pub id: SessionId,
    pub peer: SocketAddr,
    pub created_at: Instant,
    pub last_activity: ActivityClock,
    state: RwLock<ConnectionState>,
    pub stats: ConnectionStats,
}

impl ConnectionInfo {
    #[must_use]
    pub fn new(id: SessionId, peer: SocketAddr) -> Self {
        Self {
            id,
            peer,
            created_at: Instant::now(),
            last_activity: ActivityClock::start(),
            state: RwLock::new(ConnectionState::Handshaking),
            stats: ConnectionStats::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    pub fn set_state(&self, state: ConnectionState) {
        *self.state.write() = state;
    }

    pub fn touch(&self) {
        self.last_activity.touch();
    }

    /// Time since the last inbound frame.
    #[must_use]
    pub fn idle_time(&self) -> Duration {
        self.last_activity.idle_for()
    }
}

impl std::fmt::Debug for ConnectionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionInfo")
            .field("id", &self.id)
            .field("peer", &self.peer)
            .field("state", &self.state())
            .field("idle_time", &self.idle_time())
            .finish_non_exhaustive()
    }
}

// ============================================
// Session Manager
// ============================================

/// Registry of all open connections.
pub struct SessionManager {
    connections: DashMap<SessionId, Arc<ConnectionInfo>>,
    max_connections: usize,
}

impl SessionManager {
    #[must_use]
    pub fn new(max_connections: usize) -> Self {
        Self {
            connections: DashMap::new(),
            max_connections,
        }
    }

    /// Registers a freshly accepted connection.
    ///
    /// # Errors
    /// Returns `SessionLimitReached` if the registry is full.
    pub fn register(&self, peer: SocketAddr) -> Result<Arc<ConnectionInfo>> {
        if self.connections.len() >= self.max_connections {
            return Err(ServerError::SessionLimitReached {
                limit: self.max_connections,
            });
        }

        let info = Arc::new(ConnectionInfo::new(SessionId::generate(), peer));
        self.connections.insert(info.id, Arc::clone(&info));

        debug!(session_id = %info.id, peer = %peer, "Connection registered");
        Ok(info)
    }

    pub fn remove(&self, id: &SessionId) -> Option<Arc<ConnectionInfo>> {
        let removed = self.connections.remove(id).map(|(_, c)| c);

        if let Some(ref conn) = removed {
            conn.set_state(ConnectionState::Closed);
            let stats = conn.stats.snapshot();
            info!(
                session_id = %id,
                peer = %conn.peer,
                frames_rx = stats.frames_rx,
                frames_tx = stats.frames_tx,
                soft_errors = stats.soft_errors,
                games = stats.games_finished,
                duration_ms = u64::try_from(conn.created_at.elapsed().as_millis()).unwrap_or(u64::MAX),
                "Connection closed"
            );
        }

        removed
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.connections.len()
    }

    #[must_use]
    pub const fn max_connections(&self) -> usize {
        self.max_connections
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("connections", &self.count())
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn test_connection_lifecycle() {
        let manager = SessionManager::new(10);
        let conn = manager.register(peer(50000)).unwrap();

        assert_eq!(conn.state(), ConnectionState::Handshaking);
        conn.set_state(ConnectionState::Established);
        assert_eq!(conn.state(), ConnectionState::Established);
        assert_eq!(manager.count(), 1);

        let removed = manager.remove(&conn.id).unwrap();
        assert_eq!(removed.state(), ConnectionState::Closed);
        assert_eq!(manager.count(), 0);
        assert!(manager.remove(&conn.id).is_none());
    }

    #[test]
    fn test_connection_limit() {
        let manager = SessionManager::new(2);
        manager.register(peer(1)).unwrap();
        let second = manager.register(peer(2)).unwrap();

        let result = manager.register(peer(3));
        assert!(matches!(result, Err(ServerError::SessionLimitReached { limit: 2 })));

        manager.remove(&second.id);
        assert!(manager.register(peer(3)).is_ok());
    }

    #[test]
    fn test_idle_time_resets_on_touch() {
        let manager = SessionManager::new(10);
        let conn = manager.register(peer(1)).unwrap();
        std::thread::sleep(Duration::from_millis(30));

        assert!(conn.idle_time() >= Duration::from_millis(30));
        conn.touch();
        assert!(conn.idle_time() < Duration::from_millis(30));
    }

    #[test]
    fn test_stats_tracking() {
        let conn = ConnectionInfo::new(SessionId::generate(), peer(1));
        conn.stats.record_rx(100);
        conn.stats.record_rx(50);
        conn.stats.record_tx(10);
        conn.stats.record_soft_error();

        let stats = conn.stats.snapshot();
        assert_eq!(stats.frames_rx, 2);
        assert_eq!(stats.bytes_rx, 150);
        assert_eq!(stats.frames_tx, 1);
        assert_eq!(stats.soft_errors, 1);
    }
}
