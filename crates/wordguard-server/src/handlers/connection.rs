// ============================================
// File: crates/wordguard-server/src/handlers/connection.rs
// ============================================
//! # Connection Handler
//!
//! ## Creation Reason
//! Owns everything one client connection needs: the frame reader, the
//! writer task, the protocol session and the game. The dispatch loop is
//! generic over `FrameSource` so it can be driven without a socket.
//!
//! ## Error Handling
//! | error                              | action                     |
//! |------------------------------------|----------------------------|
//! | malformed / out-of-order message   | log, drop, keep connection |
//! | signature, RSA or AEAD failure     | log, close connection      |
//! | bad length prefix, socket failure  | close connection           |
//!
//! ## Last Modified
//! v0.1.0 - Initial connection handler

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use wordguard_core::session::{GameEngine, HandshakeState, ServerSession};
use wordguard_core::trust::ServerCredentials;
use wordguard_transport::{frame_queue, spawn_writer, FrameReader, FrameSender, FrameSource};

use crate::error::Result;
use crate::services::{ConnectionInfo, ConnectionState, Hangman, SessionManager, WordPool};

/// How long a closing connection waits for queued replies to flush.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Why the dispatch loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Peer closed the stream.
    PeerClosed,
    /// No inbound frame within the idle timeout.
    IdleTimeout,
    /// Server shutdown.
    Shutdown,
    /// Fatal protocol or transport error.
    Fatal,
}

enum Inbound {
    Frame(Bytes),
    Closed,
    Idle,
}

/// Shared state for serving connections.
pub struct ConnectionHandler {
    credentials: Arc<ServerCredentials>,
    words: WordPool,
    sessions: Arc<SessionManager>,
    idle_timeout: Option<Duration>,
}

impl ConnectionHandler {
    /// Creates a handler.
    pub fn new(
        credentials: Arc<ServerCredentials>,
        words: WordPool,
        sessions: Arc<SessionManager>,
        idle_timeout: Option<Duration>,
    ) -> Self {
        Self {
            credentials,
            words,
            sessions,
            idle_timeout,
        }
    }

    /// Serves one accepted stream until it closes.
    ///
    /// Always deregisters `info` before returning.
    pub async fn handle(
        &self,
        stream: TcpStream,
        info: Arc<ConnectionInfo>,
        shutdown: broadcast::Receiver<()>,
    ) -> CloseReason {
        let peer = info.peer;
        let reason = match self.serve_stream(stream, &info, shutdown).await {
            Ok(reason) => reason,
            Err(e) => {
                warn!(session_id = %info.id, peer = %peer, error = %e, "Connection setup failed");
                CloseReason::Fatal
            }
        };
        self.sessions.remove(&info.id);
        reason
    }

    async fn serve_stream(
        &self,
        stream: TcpStream,
        info: &ConnectionInfo,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<CloseReason> {
        let local = stream.local_addr()?;
        if let Err(e) = stream.set_nodelay(true) {
            debug!(peer = %info.peer, error = %e, "TCP_NODELAY not set");
        }
        let (read_half, write_half) = stream.into_split();

        let (sender, queue) = frame_queue();
        let writer = spawn_writer(write_half, queue);
        let mut reader = FrameReader::new(read_half);

        let session = ServerSession::new(
            Arc::clone(&self.credentials),
            Hangman::new(self.words.clone()),
            info.peer,
            local,
        );
        let reason = dispatch(&mut reader, &sender, session, info, self.idle_timeout, shutdown).await;

        drop(sender);
        match tokio::time::timeout(WRITER_DRAIN_TIMEOUT, writer).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => debug!(peer = %info.peer, error = %e, "Writer stopped"),
            Ok(Err(e)) => warn!(peer = %info.peer, error = %e, "Writer task failed"),
            Err(_) => warn!(peer = %info.peer, "Writer did not drain in time"),
        }
        Ok(reason)
    }
}

impl std::fmt::Debug for ConnectionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandler")
            .field("leaf", &self.credentials.leaf.body.subject)
            .field("words", &self.words.len())
            .field("idle_timeout", &self.idle_timeout)
            .finish_non_exhaustive()
    }
}

async fn next_inbound<S: FrameSource>(source: &mut S, idle: Option<Duration>) -> Result<Inbound> {
    let next = match idle {
        Some(limit) => match tokio::time::timeout(limit, source.next_frame()).await {
            Ok(next) => next,
            Err(_) => return Ok(Inbound::Idle),
        },
        None => source.next_frame().await,
    };
    Ok(next?.map_or(Inbound::Closed, Inbound::Frame))
}

/// Runs the read/dispatch loop for one connection.
///
/// Replies are queued on `sender` in the order the session produced them.
pub async fn dispatch<S, G>(
    source: &mut S,
    sender: &FrameSender,
    mut session: ServerSession<G>,
    info: &ConnectionInfo,
    idle_timeout: Option<Duration>,
    mut shutdown: broadcast::Receiver<()>,
) -> CloseReason
where
    S: FrameSource,
    G: GameEngine,
{
    let peer: SocketAddr = info.peer;
    info!(session_id = %info.id, peer = %peer, "Connection opened");

    loop {
        let inbound = tokio::select! {
            _ = shutdown.recv() => return CloseReason::Shutdown,
            inbound = next_inbound(source, idle_timeout) => inbound,
        };

        let frame = match inbound {
            Ok(Inbound::Frame(frame)) => frame,
            Ok(Inbound::Closed) => {
                debug!(peer = %peer, "Peer closed connection");
                return CloseReason::PeerClosed;
            }
            Ok(Inbound::Idle) => {
                let idle_ms = u64::try_from(info.idle_time().as_millis()).unwrap_or(u64::MAX);
                info!(peer = %peer, idle_ms, "Closing idle connection");
                return CloseReason::IdleTimeout;
            }
            Err(e) if e.is_disconnect() => {
                debug!(peer = %peer, error = %e, "Peer dropped mid-frame");
                return CloseReason::PeerClosed;
            }
            Err(e) => {
                if e.closes_connection() {
                    warn!(peer = %peer, error = %e, "Stream error");
                }
                return CloseReason::Fatal;
            }
        };

        info.touch();
        info.stats.record_rx(frame.len() as u64);
        let was_playing = session.game().is_active();

        match session.receive(&frame) {
            Ok(replies) => {
                for reply in replies {
                    info.stats.record_tx(reply.len() as u64);
                    if sender.send(reply).is_err() {
                        debug!(peer = %peer, "Writer gone");
                        return CloseReason::Fatal;
                    }
                }
            }
            Err(e) if e.is_fatal() => {
                if e.is_suspicious() {
                    error!(peer = %peer, error = %e, "Closing connection on security failure");
                } else {
                    warn!(peer = %peer, error = %e, "Closing connection");
                }
                return CloseReason::Fatal;
            }
            Err(e) => {
                info.stats.record_soft_error();
                warn!(peer = %peer, state = %session.state(), error = %e, "Dropping message");
            }
        }

        if session.state() == HandshakeState::Established && info.state() == ConnectionState::Handshaking {
            info.set_state(ConnectionState::Established);
        }
        if was_playing && !session.game().is_active() {
            info.stats.record_game_finished();
        }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;
    use wordguard_core::protocol::{FrameDecoder, Message, MessageKind};
    use wordguard_core::session::{seal_message, Sealing};
    use wordguard_core::trust::TrustOptions;
    use wordguard_core::RsaKeyPair;
    use wordguard_transport::TransportError;

    use super::*;

    /// Replays scripted frames, then reports a clean close.
    struct Script(VecDeque<Bytes>);

    #[async_trait]
    impl FrameSource for Script {
        async fn next_frame(&mut self) -> wordguard_transport::Result<Option<Bytes>> {
            Ok(self.0.pop_front())
        }
    }

    /// Never yields a frame.
    struct Silent;

    #[async_trait]
    impl FrameSource for Silent {
        async fn next_frame(&mut self) -> wordguard_transport::Result<Option<Bytes>> {
            std::future::pending::<()>().await;
            Ok(None)
        }
    }

    /// Fails like a corrupted length prefix.
    struct Broken;

    #[async_trait]
    impl FrameSource for Broken {
        async fn next_frame(&mut self) -> wordguard_transport::Result<Option<Bytes>> {
            Err(TransportError::Core(wordguard_core::CoreError::EmptyFrame))
        }
    }

    /// Loses the peer halfway through a frame.
    struct Truncated;

    #[async_trait]
    impl FrameSource for Truncated {
        async fn next_frame(&mut self) -> wordguard_transport::Result<Option<Bytes>> {
            Err(TransportError::ConnectionClosed { buffered: 5 })
        }
    }

    fn body(wire: &Bytes) -> Bytes {
        let mut decoder = FrameDecoder::new();
        decoder.extend(wire);
        decoder.next_frame().unwrap().unwrap()
    }

    fn credentials() -> Arc<ServerCredentials> {
        static CREDENTIALS: std::sync::OnceLock<Arc<ServerCredentials>> = std::sync::OnceLock::new();
        Arc::clone(CREDENTIALS.get_or_init(|| {
            Arc::new(ServerCredentials::generate(&TrustOptions::default()).unwrap())
        }))
    }

    fn setup() -> (ServerSession<Hangman>, Arc<ConnectionInfo>, Arc<SessionManager>) {
        let creds = credentials();
        let manager = Arc::new(SessionManager::new(4));
        let info = manager.register("127.0.0.1:50000".parse().unwrap()).unwrap();
        let session = ServerSession::new(
            creds,
            Hangman::new(WordPool::from_words(["apple"]).unwrap()),
            info.peer,
            "127.0.0.1:4444".parse().unwrap(),
        );
        (session, info, manager)
    }

    #[tokio::test]
    async fn test_soft_errors_keep_connection() {
        let (session, info, _manager) = setup();
        let client = RsaKeyPair::generate().unwrap();
        let hello = Message::new(MessageKind::PubKeyRequest, client.public_key().to_der().unwrap());

        let mut script = Script(VecDeque::from(vec![
            Bytes::from_static(b"garbage"),
            body(&seal_message(&Message::text("a"), Sealing::Plain).unwrap()),
            body(&seal_message(&hello, Sealing::Plain).unwrap()),
        ]));
        let (sender, mut queue) = frame_queue();
        let (_tx, rx) = broadcast::channel(1);

        let reason = dispatch(&mut script, &sender, session, &info, None, rx).await;
        assert_eq!(reason, CloseReason::PeerClosed);

        let stats = info.stats.snapshot();
        assert_eq!(stats.frames_rx, 3);
        assert_eq!(stats.soft_errors, 2);
        assert_eq!(stats.frames_tx, 1);
        assert!(queue.try_recv().is_ok());
        assert_eq!(info.state(), ConnectionState::Handshaking);
    }

    #[tokio::test]
    async fn test_fatal_stream_error_closes() {
        let (session, info, _manager) = setup();
        let (sender, _queue) = frame_queue();
        let (_tx, rx) = broadcast::channel(1);

        let reason = dispatch(&mut Broken, &sender, session, &info, None, rx).await;
        assert_eq!(reason, CloseReason::Fatal);
    }

    #[tokio::test]
    async fn test_peer_lost_mid_frame_is_not_fatal() {
        let (session, info, _manager) = setup();
        let (sender, _queue) = frame_queue();
        let (_tx, rx) = broadcast::channel(1);

        let reason = dispatch(&mut Truncated, &sender, session, &info, None, rx).await;
        assert_eq!(reason, CloseReason::PeerClosed);
    }

    #[tokio::test]
    async fn test_idle_timeout() {
        let (session, info, _manager) = setup();
        let (sender, _queue) = frame_queue();
        let (_tx, rx) = broadcast::channel(1);

        let reason = dispatch(&mut Silent, &sender, session, &info, Some(Duration::from_millis(20)), rx).await;
        assert_eq!(reason, CloseReason::IdleTimeout);
    }

    #[tokio::test]
    async fn test_shutdown_signal() {
        let (session, info, _manager) = setup();
        let (sender, _queue) = frame_queue();
        let (tx, rx) = broadcast::channel(1);

        let task = tokio::spawn(async move {
            let mut silent = Silent;
            dispatch(&mut silent, &sender, session, &info, None, rx).await
        });
        tx.send(()).unwrap();
        assert_eq!(task.await.unwrap(), CloseReason::Shutdown);
    }
}
