// ============================================
// File: crates/wordguard-client/src/runner.rs
// ============================================
//! # Game Runner
//!
//! ## Creation Reason
//! Drives one client run: connects, completes the handshake, relays the
//! player's guesses and reports how the game ended.
//!
//! ## Main Functionality
//! - `GameClient`: connection setup and the interactive loop
//! - Turn-taking: one guess is read only after the previous reply
//!
//! ## Run Loop
//! ```text
//!            ┌────────────── select ──────────────┐
//!            ▼                                    ▼
//!   FrameReader::next_frame              input.next_line
//!            │                          (only when no reply
//!            ▼                            is outstanding)
//!   ClientSession::receive                        │
//!            │                                    ▼
//!   Send ─► writer task           validate_guess ─► ClientSession::guess
//!   Hint ─► output                                      │
//!   GameOver ─► Outcome                                 ▼
//!                                                  writer task
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Soft protocol errors are logged and the loop continues; anything
//!   fatal ends the run with an `Outcome`
//! - Output goes to the supplied writer, logs go to stderr
//!
//! ## Last Modified
//! v0.1.0 - Initial runner

use std::io::Write;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

use wordguard_core::crypto::{PublicKey, RsaKeyPair};
use wordguard_core::{ClientAction, ClientSession};
use wordguard_transport::{connect, frame_queue, spawn_writer, FrameReader, FrameSender, FrameSource};

use crate::input::validate_guess;
use crate::outcome::Outcome;

/// How long the writer may take to flush after the game ends.
const WRITER_DRAIN: Duration = Duration::from_secs(1);

/// One player's connection to one server.
pub struct GameClient {
    addr: SocketAddr,
    verifying_key: PublicKey,
    key: RsaKeyPair,
}

impl GameClient {
    /// Creates a client that trusts envelopes signed by `verifying_key`.
    #[must_use]
    pub const fn new(addr: SocketAddr, verifying_key: PublicKey, key: RsaKeyPair) -> Self {
        Self {
            addr,
            verifying_key,
            key,
        }
    }

    /// Plays one game, reading guesses from `input` and writing hints
    /// and notices to `out`.
    pub async fn play<I, O>(&self, input: I, out: &mut O) -> Outcome
    where
        I: AsyncBufRead + Unpin,
        O: Write,
    {
        let stream = match connect(self.addr).await {
            Ok(stream) => stream,
            Err(e) => return Outcome::from_transport_error(&e),
        };
        let (local, peer) = match (stream.local_addr(), stream.peer_addr()) {
            (Ok(local), Ok(peer)) => (local, peer),
            (Err(e), _) | (_, Err(e)) => {
                return Outcome::ConnectionLost {
                    reason: e.to_string(),
                }
            }
        };
        info!(server = %peer, "Connected");

        let (read_half, write_half) = stream.into_split();
        let (tx, rx) = frame_queue();
        let writer = spawn_writer(write_half, rx);
        let mut reader = FrameReader::new(read_half);
        let mut session = ClientSession::new(self.key.clone(), self.verifying_key.clone(), local, peer);

        let outcome = run_game(&mut session, &mut reader, &tx, input, out).await;

        drop(tx);
        if tokio::time::timeout(WRITER_DRAIN, writer).await.is_err() {
            debug!("Writer still busy at exit");
        }
        outcome
    }
}

async fn run_game<S, I, O>(
    session: &mut ClientSession,
    reader: &mut S,
    tx: &FrameSender,
    input: I,
    out: &mut O,
) -> Outcome
where
    S: FrameSource,
    I: AsyncBufRead + Unpin,
    O: Write,
{
    let hello = match session.start() {
        Ok(frame) => frame,
        Err(e) => return Outcome::from_core_error(&e),
    };
    if tx.send(hello).is_err() {
        return writer_gone();
    }

    let mut lines = input.lines();
    // The first hint counts as the reply to the handshake.
    let mut awaiting_reply = true;

    loop {
        tokio::select! {
            next = reader.next_frame() => {
                let frame = match next {
                    Ok(Some(frame)) => frame,
                    Ok(None) => {
                        return Outcome::ConnectionLost {
                            reason: "server closed the connection".to_string(),
                        }
                    }
                    Err(e) => return Outcome::from_transport_error(&e),
                };

                let actions = match session.receive(&frame) {
                    Ok(actions) => actions,
                    Err(e) if e.is_soft() => {
                        warn!(error = %e, "Dropped server message");
                        continue;
                    }
                    Err(e) => return Outcome::from_core_error(&e),
                };

                for action in actions {
                    match action {
                        ClientAction::Send(frame) => {
                            if tx.send(frame).is_err() {
                                return writer_gone();
                            }
                        }
                        ClientAction::Established => {
                            info!("Secure session established");
                            say(out, "CLIENT - Secure session established, starting game");
                        }
                        ClientAction::Hint(hint) => {
                            say(out, &hint);
                            awaiting_reply = false;
                        }
                        ClientAction::TamperWarning(reason) => {
                            say(out, &format!("WARNING - Possible tampering: {reason}"));
                        }
                        ClientAction::GameOver { score, confirmed } => {
                            return if confirmed {
                                Outcome::Completed { score }
                            } else {
                                Outcome::Tampered { score }
                            };
                        }
                    }
                }
            }
            line = lines.next_line(), if !awaiting_reply => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => return Outcome::Abandoned,
                    Err(e) => {
                        warn!(error = %e, "Reading input failed");
                        return Outcome::Abandoned;
                    }
                };

                let guess = match validate_guess(&line) {
                    Ok(guess) => guess,
                    Err(e) => {
                        say(out, &e.to_string());
                        continue;
                    }
                };

                match session.guess(guess) {
                    Ok(frame) => {
                        if tx.send(frame).is_err() {
                            return writer_gone();
                        }
                        awaiting_reply = true;
                    }
                    Err(e) => return Outcome::from_core_error(&e),
                }
            }
        }
    }
}

fn say<O: Write>(out: &mut O, text: &str) {
    // Terminal output is best effort; the outcome is still reported.
    let _ = writeln!(out, "{text}");
    let _ = out.flush();
}

fn writer_gone() -> Outcome {
    Outcome::ConnectionLost {
        reason: "connection writer stopped".to_string(),
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, OnceLock};

    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    use wordguard_core::trust::{ServerCredentials, TrustOptions};
    use wordguard_core::{GameEngine, ServerSession, TurnOutcome};

    fn credentials() -> &'static ServerCredentials {
        static CREDENTIALS: OnceLock<ServerCredentials> = OnceLock::new();
        CREDENTIALS.get_or_init(|| ServerCredentials::generate(&TrustOptions::default()).unwrap())
    }

    fn player_key() -> RsaKeyPair {
        static KEY: OnceLock<RsaKeyPair> = OnceLock::new();
        KEY.get_or_init(|| RsaKeyPair::generate().unwrap()).clone()
    }

    /// Plays "apple" but commits to `claimed`.
    struct StubGame {
        claimed: &'static str,
        hint: String,
        letters: i64,
        active: bool,
    }

    impl StubGame {
        fn new(claimed: &'static str) -> Self {
            Self {
                claimed,
                hint: String::new(),
                letters: 0,
                active: false,
            }
        }
    }

    impl GameEngine for StubGame {
        fn start(&mut self) -> String {
            self.active = true;
            self.letters = 0;
            self.hint = "_____".to_string();
            self.hint.clone()
        }

        fn answer(&self) -> &str {
            self.claimed
        }

        fn process(&mut self, guess: &str) -> TurnOutcome {
            if guess == "apple" {
                self.active = false;
                return TurnOutcome::Finished {
                    score: 50 - 2 * self.letters,
                };
            }
            if guess.len() == 1 {
                self.letters += 1;
                self.hint = "apple"
                    .chars()
                    .zip(self.hint.chars())
                    .map(|(a, h)| if guess.starts_with(a) { a } else { h })
                    .collect();
            }
            TurnOutcome::Hint(self.hint.clone())
        }

        fn is_active(&self) -> bool {
            self.active
        }
    }

    async fn spawn_server(claimed: &'static str) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, peer) = listener.accept().await.unwrap();
            let local = stream.local_addr().unwrap();
            let (read_half, mut write_half) = stream.into_split();
            let mut reader = FrameReader::new(read_half);
            let mut session = ServerSession::new(
                Arc::new(credentials().clone()),
                StubGame::new(claimed),
                peer,
                local,
            );
            while let Ok(Some(frame)) = reader.next_frame().await {
                match session.receive(&frame) {
                    Ok(replies) => {
                        for reply in replies {
                            if write_half.write_all(&reply).await.is_err() {
                                return;
                            }
                        }
                    }
                    Err(e) if e.is_soft() => {}
                    Err(_) => return,
                }
            }
        });
        addr
    }

    fn client(addr: SocketAddr) -> GameClient {
        let verifying_key = credentials().leaf.public_key().unwrap();
        GameClient::new(addr, verifying_key, player_key())
    }

    #[tokio::test]
    async fn test_completed_game() {
        let addr = spawn_server("apple").await;
        let mut out = Vec::new();

        let outcome = client(addr).play(&b"a\napple\n"[..], &mut out).await;

        assert_eq!(outcome, Outcome::Completed { score: "48".into() });
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("_____"));
        assert!(text.contains("a____"));
    }

    #[tokio::test]
    async fn test_invalid_line_is_not_sent() {
        let addr = spawn_server("apple").await;
        let mut out = Vec::new();

        let outcome = client(addr).play(&b"a1\napple\n"[..], &mut out).await;

        assert_eq!(outcome, Outcome::Completed { score: "50".into() });
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("english alphabet"));
    }

    #[tokio::test]
    async fn test_unconfirmed_commitment_is_tampered() {
        let addr = spawn_server("pear").await;
        let mut out = Vec::new();

        let outcome = client(addr).play(&b"apple\n"[..], &mut out).await;

        assert_eq!(outcome, Outcome::Tampered { score: "50".into() });
        assert_eq!(outcome.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_wrong_server_key_is_untrusted() {
        let addr = spawn_server("apple").await;
        let impostor = GameClient::new(addr, player_key().public_key().clone(), player_key());
        let mut out = Vec::new();

        let outcome = impostor.play(&b""[..], &mut out).await;

        assert!(matches!(outcome, Outcome::Untrusted { .. }));
    }

    #[tokio::test]
    async fn test_input_closed_before_game_over() {
        let addr = spawn_server("apple").await;
        let mut out = Vec::new();

        let outcome = client(addr).play(&b"a\n"[..], &mut out).await;

        assert_eq!(outcome, Outcome::Abandoned);
    }

    #[tokio::test]
    async fn test_server_gone() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            drop(stream);
        });
        let mut out = Vec::new();

        let outcome = client(addr).play(&b""[..], &mut out).await;

        assert!(matches!(outcome, Outcome::ConnectionLost { .. }));
    }
}
