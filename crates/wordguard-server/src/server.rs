// ============================================
// File: crates/wordguard-server/src/server.rs
// ============================================
//! # Server Orchestrator
//!
//! ## Creation Reason
//! Main server implementation: binds the listener, accepts connections,
//! enforces the connection limit and hands each stream to its own task.
//!
//! ## Main Functionality
//! - `Server`: lifecycle management
//! - Accept loop with connection limit
//! - Graceful shutdown via broadcast signal
//!
//! ## Server Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Server                              │
//! │                                                             │
//! │  ┌────────────┐   accept   ┌──────────────────────────────┐ │
//! │  │ TcpListener│──────────► │ SessionManager::register     │ │
//! │  └────────────┘            └──────────────┬───────────────┘ │
//! │                                           │ spawn           │
//! │                    ┌──────────────────────┼───────────┐     │
//! │                    ▼                      ▼           ▼     │
//! │            ┌──────────────┐      ┌──────────────┐   ...     │
//! │            │ connection 1 │      │ connection 2 │           │
//! │            │ reader+writer│      │ reader+writer│           │
//! │            └──────────────┘      └──────────────┘           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Connections share only read-only credentials, the word pool and
//!   the registry
//! - Graceful shutdown waits up to 5s for connection tasks
//!
//! ## Last Modified
//! v0.1.0 - Initial server implementation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use wordguard_core::trust::ServerCredentials;
use wordguard_transport::bind_listener;

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::handlers::ConnectionHandler;
use crate::services::{SessionManager, WordPool};

/// Grace period for connection tasks on shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

// ============================================
// Server
// ============================================

/// Main wordguard server.
///
/// # Lifecycle
/// 1. Create with `Server::new(config, credentials, words)`
/// 2. Start with `server.run().await`, or `bind` + `serve`
/// 3. Shutdown via Ctrl+C or `shutdown()`
pub struct Server {
    /// Server configuration.
    config: ServerConfig,
    /// Per-connection handler state.
    handler: Arc<ConnectionHandler>,
    /// Open connections.
    sessions: Arc<SessionManager>,
    /// Shutdown flag.
    shutdown: Arc<AtomicBool>,
    /// Shutdown signal sender.
    shutdown_tx: broadcast::Sender<()>,
}

impl Server {
    /// Creates a new server instance.
    pub fn new(config: ServerConfig, credentials: ServerCredentials, words: WordPool) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let sessions = Arc::new(SessionManager::new(config.max_connections()));
        let handler = Arc::new(ConnectionHandler::new(
            Arc::new(credentials),
            words,
            Arc::clone(&sessions),
            config.idle_timeout(),
        ));
        Self {
            config,
            handler,
            sessions,
            shutdown: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    /// Binds the configured listen address.
    ///
    /// # Errors
    /// `StartupFailed` if the address cannot be bound.
    pub fn bind(&self) -> Result<TcpListener> {
        bind_listener(self.config.listen_addr())
            .map_err(|e| ServerError::startup_failed(format!("TCP bind failed: {e}")))
    }

    /// Runs the server until Ctrl+C.
    ///
    /// # Errors
    /// Returns error if server fails to start.
    pub async fn run(&self) -> Result<()> {
        info!("Starting wordguard server v{}", env!("CARGO_PKG_VERSION"));
        let listener = self.bind()?;

        let shutdown_tx = self.shutdown_tx.clone();
        let shutdown = Arc::clone(&self.shutdown);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received shutdown signal"),
                Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
            }
            shutdown.store(true, Ordering::SeqCst);
            let _ = shutdown_tx.send(());
        });

        self.serve(listener).await
    }

    /// Accepts connections on `listener` until shutdown.
    ///
    /// # Errors
    /// Currently only returns `Ok`; accept errors are logged.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let mut tasks = JoinSet::new();

        if let Ok(addr) = listener.local_addr() {
            info!(
                "Listening on {} (max connections {})",
                addr,
                self.sessions.max_connections()
            );
        }

        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    debug!("Accept loop received shutdown signal");
                    break;
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        warn!("Connection task failed: {}", e);
                    }
                }
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(pair) => pair,
                        Err(e) => {
                            warn!("Accept failed: {}", e);
                            continue;
                        }
                    };

                    let info = match self.sessions.register(peer) {
                        Ok(info) => info,
                        Err(e) => {
                            warn!(peer = %peer, error = %e, "Rejecting connection");
                            drop(stream);
                            continue;
                        }
                    };

                    let handler = Arc::clone(&self.handler);
                    let conn_shutdown = self.shutdown_tx.subscribe();
                    tasks.spawn(async move {
                        let reason = handler.handle(stream, info, conn_shutdown).await;
                        debug!(peer = %peer, reason = ?reason, "Connection task finished");
                    });
                }
            }
        }

        info!("Shutting down server...");
        self.shutdown();
        let drain = async { while tasks.join_next().await.is_some() {} };
        if tokio::time::timeout(SHUTDOWN_GRACE, drain).await.is_err() {
            warn!("Connection tasks timed out during shutdown");
            tasks.abort_all();
        }

        info!("Server shutdown complete");
        Ok(())
    }

    /// Triggers server shutdown programmatically.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(());
    }

    /// Open connection registry.
    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("listen_addr", &self.config.network.listen_addr)
            .field("connections", &self.sessions.count())
            .finish()
    }
}
