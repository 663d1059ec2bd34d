// ============================================
// File: crates/wordguard-core/src/session/client.rs
// ============================================
//! # Client Session Dispatcher
//!
//! ## Creation Reason
//! Client half of the protocol. It starts the handshake, checks every
//! pre-session envelope against the server certificate key, takes over
//! the session key and then tracks the game commitment so a changed
//! answer can be reported.
//!
//! ## Main Logical Flow
//! 1. `start()` → plain `PubKeyRequest`
//! 2. `PubKeyResponse` (signed) → RSA-encrypted `SymKeyRequest`
//! 3. `SymKeyResponse` (encrypted + signed) → AEAD `"START GAME"`
//! 4. Hints and `GameOver` are surfaced as [`ClientAction`]s
//!
//! ## ⚠️ Important Note for Next Developer
//! - Signature checks use the certificate key, NOT the key carried in
//!   `PubKeyResponse`; the latter only encrypts
//! - A signature failure is fatal: the caller reports "server untrusted"
//!
//! ## Last Modified
//! v0.1.0 - Initial client dispatcher

use std::net::SocketAddr;

use bytes::Bytes;
use tracing::{debug, info, trace, warn};

use wordguard_common::time::MinuteStamp;

use crate::crypto::asymmetric::verify_signature;
use crate::crypto::commitment::Commitment;
use crate::crypto::keys::{PublicKey, RsaKeyPair, SessionKey};
use crate::error::{CoreError, Result};
use crate::protocol::codec::{decode_envelope, decode_message};
use crate::protocol::messages::{kind_name, Message, MessageKind, START_GAME};
use crate::session::state::{seal_message, CryptoPhase, HandshakeState, Sealing};

// ============================================
// ClientAction
// ============================================

/// What the caller must do after an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientAction {
    /// Write this frame to the server.
    Send(Bytes),
    /// The session key is in place.
    Established,
    /// Show a hint to the player.
    Hint(String),
    /// The server sent a second, different commitment.
    TamperWarning(String),
    /// The game ended.
    GameOver {
        /// Score text as sent by the server
        score: String,
        /// Whether the commitment was reproduced during play
        confirmed: bool,
    },
}

// ============================================
// ClientSession
// ============================================

/// Client side of one connection.
pub struct ClientSession {
    own_key: RsaKeyPair,
    verifying_key: PublicKey,
    local_addr: SocketAddr,
    peer_addr: SocketAddr,
    state: HandshakeState,
    phase: CryptoPhase,
    commitment: Option<Commitment>,
    started: Option<MinuteStamp>,
    confirmed: bool,
    last_hint: String,
}

impl ClientSession {
    /// Creates a session that trusts signatures by `verifying_key`.
    pub fn new(
        own_key: RsaKeyPair,
        verifying_key: PublicKey,
        local_addr: SocketAddr,
        peer_addr: SocketAddr,
    ) -> Self {
        Self {
            own_key,
            verifying_key,
            local_addr,
            peer_addr,
            state: HandshakeState::Init,
            phase: CryptoPhase::Unencrypted,
            commitment: None,
            started: None,
            confirmed: false,
            last_hint: String::new(),
        }
    }

    /// Current handshake state.
    #[must_use]
    pub const fn state(&self) -> HandshakeState {
        self.state
    }

    /// Whether the session key is in place.
    #[must_use]
    pub const fn is_established(&self) -> bool {
        matches!(self.state, HandshakeState::Established)
    }

    /// Whether a guess reproduced the stored commitment.
    #[must_use]
    pub const fn commitment_confirmed(&self) -> bool {
        self.confirmed
    }

    /// Most recent hint text.
    #[must_use]
    pub fn last_hint(&self) -> &str {
        &self.last_hint
    }

    /// Builds the opening `PubKeyRequest`.
    ///
    /// # Errors
    /// `InvalidState` if already started, or key encoding failures.
    pub fn start(&mut self) -> Result<Bytes> {
        if self.state != HandshakeState::Init {
            return Err(CoreError::invalid_state("start", HandshakeState::Init.as_str()));
        }
        let request = Message::new(MessageKind::PubKeyRequest, self.own_key.public_key().to_der()?);
        let frame = seal_message(&request, Sealing::Plain)?;
        self.state = HandshakeState::AwaitingServerKey;
        Ok(frame)
    }

    /// Processes one inbound frame body.
    ///
    /// # Errors
    /// `SignatureVerification`, `Decryption` and `Authentication` are
    /// fatal; malformed or unexpected messages are soft.
    pub fn receive(&mut self, frame: &[u8]) -> Result<Vec<ClientAction>> {
        let envelope = decode_envelope(frame)?;
        if self.phase.session_key().is_none() {
            verify_signature(&self.verifying_key, &envelope.ciphertext, &envelope.tag)?;
        }
        let plaintext = self.phase.open(&envelope, &self.own_key)?;
        let msg = decode_message(&plaintext)?;
        trace!(kind = kind_name(msg.kind), phase = self.phase.name(), "Inbound message");

        match (msg.kind, self.state) {
            (Some(MessageKind::PubKeyResponse), HandshakeState::AwaitingServerKey) => {
                self.on_pub_key_response(&msg)
            }
            (Some(MessageKind::SymKeyResponse), HandshakeState::AwaitingSessionKey) => {
                self.on_sym_key_response(&msg)
            }
            (_, HandshakeState::Established) if msg.is_game_text() => self.on_hint(&msg),
            (Some(MessageKind::GameOver), HandshakeState::Established) => {
                let score = msg.content_str()?.to_string();
                info!(score = %score, confirmed = self.confirmed, "Game over");
                Ok(vec![ClientAction::GameOver {
                    score,
                    confirmed: self.confirmed,
                }])
            }
            (kind, state) => Err(CoreError::unexpected(kind_name(kind), state.as_str())),
        }
    }

    /// Builds the frame carrying a player guess.
    ///
    /// Attaches the stored commitment when the guess completes the
    /// answer it was computed over.
    ///
    /// # Errors
    /// `InvalidState` before the session is established.
    pub fn guess(&mut self, input: &str) -> Result<Bytes> {
        let key = self
            .phase
            .session_key()
            .ok_or_else(|| CoreError::invalid_state("guess", HandshakeState::Established.as_str()))?;

        let mut msg = Message::text(input);
        if let (Some(commitment), Some(started)) = (&self.commitment, self.started) {
            let candidate = candidate_answer(&self.last_hint, input);
            // The server may have committed just before the minute rolled over.
            let reproduced = [started, started.previous()].iter().any(|minute| {
                &Commitment::compute(minute, &candidate, &self.local_addr, &self.peer_addr) == commitment
            });
            if reproduced {
                debug!("Guess reproduces the game commitment");
                msg = msg.with_commitment(commitment.as_bytes().to_vec());
                self.confirmed = true;
            }
        }
        seal_message(&msg, Sealing::Aead(key))
    }

    fn on_pub_key_response(&mut self, msg: &Message) -> Result<Vec<ClientAction>> {
        let server_key = PublicKey::from_der(&msg.content)
            .map_err(|e| CoreError::malformed(format!("server public key: {e}")))?;
        debug!(key = ?server_key, "Server public key received");

        let request = Message::new(MessageKind::SymKeyRequest, Vec::new());
        let frame = seal_message(&request, Sealing::Encrypted(&server_key))?;

        self.phase = CryptoPhase::Asymmetric { peer_key: server_key };
        self.state = HandshakeState::AwaitingSessionKey;
        Ok(vec![ClientAction::Send(frame)])
    }

    fn on_sym_key_response(&mut self, msg: &Message) -> Result<Vec<ClientAction>> {
        let key = SessionKey::from_slice(&msg.content)
            .map_err(|e| CoreError::malformed(format!("session key: {e}")))?;
        let frame = seal_message(&Message::text(START_GAME), Sealing::Aead(&key))?;

        self.phase = CryptoPhase::Symmetric(key);
        self.state = HandshakeState::Established;
        info!(peer = %self.peer_addr, "Session established");
        Ok(vec![ClientAction::Established, ClientAction::Send(frame)])
    }

    fn on_hint(&mut self, msg: &Message) -> Result<Vec<ClientAction>> {
        let hint = msg.content_str()?.to_string();
        let mut actions = Vec::with_capacity(2);

        if !msg.commitment.is_empty() {
            let received = Commitment::from_slice(&msg.commitment)?;
            match &self.commitment {
                None => {
                    self.commitment = Some(received);
                    self.started = Some(MinuteStamp::now());
                }
                Some(stored) if *stored == received => {}
                Some(_) => {
                    warn!("Server sent a different game commitment");
                    actions.push(ClientAction::TamperWarning(
                        "the server sent a new commitment mid-game".to_string(),
                    ));
                }
            }
        }

        if is_hint_text(&self.last_hint, &hint) {
            self.last_hint.clone_from(&hint);
        } else {
            debug!(text = %hint, "Server notice kept out of the hint");
        }
        actions.push(ClientAction::Hint(hint));
        Ok(actions)
    }
}

/// Whether `text` is a hint rather than a server notice such as a
/// length rejection. Hints keep the word's length once it is known.
fn is_hint_text(previous: &str, text: &str) -> bool {
    !text.is_empty()
        && text.bytes().all(|b| b == b'_' || b.is_ascii_lowercase())
        && (previous.is_empty() || previous.len() == text.len())
}

/// The answer a guess would reveal given the last hint.
fn candidate_answer(last_hint: &str, guess: &str) -> String {
    let lower = guess.to_lowercase();
    if lower.chars().count() == 1 {
        last_hint.replace('_', &lower)
    } else {
        lower
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::protocol::frame::FrameDecoder;
    use crate::session::game::{GameEngine, TurnOutcome};
    use crate::session::server::ServerSession;
    use crate::trust::store::{ServerCredentials, TrustOptions};

    const TOO_LONG: &str = "Guesses are limited to 100 characters in length.";

    /// Answer "apple"; "a" → "a____", "p" → "app__", "e" → "app_e",
    /// anything over 100 bytes is refused and anything else finishes.
    struct ScriptedGame {
        active: bool,
    }

    impl GameEngine for ScriptedGame {
        fn start(&mut self) -> String {
            self.active = true;
            "_____".to_string()
        }

        fn answer(&self) -> &str {
            "apple"
        }

        fn process(&mut self, guess: &str) -> TurnOutcome {
            match guess {
                "a" => TurnOutcome::Hint("a____".to_string()),
                "p" => TurnOutcome::Hint("app__".to_string()),
                "e" => TurnOutcome::Hint("app_e".to_string()),
                long if long.len() > 100 => TurnOutcome::Rejected(TOO_LONG.to_string()),
                _ => {
                    self.active = false;
                    TurnOutcome::Finished { score: 44 }
                }
            }
        }

        fn is_active(&self) -> bool {
            self.active
        }
    }

    fn unframe(wire: &Bytes) -> Bytes {
        let mut decoder = FrameDecoder::new();
        decoder.extend(wire);
        decoder.next_frame().unwrap().unwrap()
    }

    struct Pair {
        client: ClientSession,
        server: ServerSession<ScriptedGame>,
    }

    impl Pair {
        fn new() -> Self {
            let creds = Arc::new(ServerCredentials::generate(&TrustOptions::default()).unwrap());
            let client_addr: SocketAddr = "127.0.0.1:50001".parse().unwrap();
            let server_addr: SocketAddr = "127.0.0.1:4444".parse().unwrap();
            let client = ClientSession::new(
                RsaKeyPair::generate().unwrap(),
                creds.signing_key.public_key().clone(),
                client_addr,
                server_addr,
            );
            let server = ServerSession::new(creds, ScriptedGame { active: false }, client_addr, server_addr);
            Self { client, server }
        }

        /// Delivers one client frame and feeds every reply back, returning
        /// the non-send actions.
        fn deliver(&mut self, frame: &Bytes) -> Vec<ClientAction> {
            let mut pending = vec![frame.clone()];
            let mut surfaced = Vec::new();
            while let Some(out) = pending.pop() {
                for reply in self.server.receive(&unframe(&out)).unwrap() {
                    for action in self.client.receive(&unframe(&reply)).unwrap() {
                        match action {
                            ClientAction::Send(next) => pending.push(next),
                            other => surfaced.push(other),
                        }
                    }
                }
            }
            surfaced
        }
    }

    #[test]
    fn test_candidate_answer() {
        assert_eq!(candidate_answer("app_e", "L"), "apple");
        assert_eq!(candidate_answer("_____", "a"), "aaaaa");
        assert_eq!(candidate_answer("a____", "Apple"), "apple");
    }

    #[test]
    fn test_is_hint_text() {
        assert!(is_hint_text("", "_____"));
        assert!(is_hint_text("_____", "app_e"));
        assert!(!is_hint_text("app_e", "app"));
        assert!(!is_hint_text("app_e", TOO_LONG));
    }

    #[test]
    fn test_rejected_guess_keeps_hint() {
        let mut pair = Pair::new();
        let hello = pair.client.start().unwrap();
        pair.deliver(&hello);
        for guess in ["a", "p", "e"] {
            let frame = pair.client.guess(guess).unwrap();
            pair.deliver(&frame);
        }

        let frame = pair.client.guess(&"b".repeat(101)).unwrap();
        assert_eq!(pair.deliver(&frame), vec![ClientAction::Hint(TOO_LONG.to_string())]);
        assert_eq!(pair.client.last_hint(), "app_e");

        let frame = pair.client.guess("l").unwrap();
        assert_eq!(
            pair.deliver(&frame),
            vec![ClientAction::GameOver {
                score: "44".to_string(),
                confirmed: true,
            }]
        );
    }

    #[test]
    fn test_commitment_from_previous_minute_confirms() {
        let mut pair = Pair::new();
        let hello = pair.client.start().unwrap();
        pair.deliver(&hello);

        let started = pair.client.started.unwrap();
        let earlier = Commitment::compute(
            &started.previous(),
            "apple",
            &pair.client.local_addr,
            &pair.client.peer_addr,
        );
        pair.client.commitment = Some(earlier);

        let frame = pair.client.guess("apple").unwrap();
        assert!(pair.client.commitment_confirmed());
        let key = pair.server.session_key().unwrap().clone();
        let env = decode_envelope(&unframe(&frame)).unwrap();
        let plaintext = crate::crypto::transport::open(&key, &env.ciphertext, &env.tag).unwrap();
        let msg = decode_message(&plaintext).unwrap();
        assert!(earlier.matches(&msg.commitment));
    }

    #[test]
    fn test_handshake_and_first_hint() {
        let mut pair = Pair::new();
        let hello = pair.client.start().unwrap();
        assert_eq!(pair.client.state(), HandshakeState::AwaitingServerKey);

        let actions = pair.deliver(&hello);
        assert_eq!(
            actions,
            vec![ClientAction::Established, ClientAction::Hint("_____".to_string())]
        );
        assert!(pair.client.is_established());
        assert_eq!(pair.server.state(), HandshakeState::Established);
        assert_eq!(pair.client.last_hint(), "_____");
        assert!(pair.client.start().is_err());
    }

    #[test]
    fn test_confirmed_game() {
        let mut pair = Pair::new();
        let hello = pair.client.start().unwrap();
        pair.deliver(&hello);

        for (guess, hint) in [("a", "a____"), ("p", "app__"), ("e", "app_e")] {
            let frame = pair.client.guess(guess).unwrap();
            assert_eq!(pair.deliver(&frame), vec![ClientAction::Hint(hint.to_string())]);
        }
        assert!(!pair.client.commitment_confirmed());

        let frame = pair.client.guess("l").unwrap();
        assert!(pair.client.commitment_confirmed());
        let actions = pair.deliver(&frame);
        assert!(pair.server.commitment_confirmed());
        assert_eq!(
            actions,
            vec![ClientAction::GameOver {
                score: "44".to_string(),
                confirmed: true,
            }]
        );
    }

    #[test]
    fn test_unconfirmed_game_over() {
        let mut pair = Pair::new();
        let hello = pair.client.start().unwrap();
        pair.deliver(&hello);

        let frame = pair.client.guess("x").unwrap();
        assert_eq!(
            pair.deliver(&frame),
            vec![ClientAction::GameOver {
                score: "44".to_string(),
                confirmed: false,
            }]
        );
    }

    #[test]
    fn test_guess_before_established() {
        let mut pair = Pair::new();
        assert!(pair.client.guess("a").is_err());
    }

    #[test]
    fn test_forged_signature_is_fatal() {
        let creds = ServerCredentials::generate(&TrustOptions::default()).unwrap();
        let impostor = RsaKeyPair::generate().unwrap();
        let mut client = ClientSession::new(
            RsaKeyPair::generate().unwrap(),
            creds.signing_key.public_key().clone(),
            "127.0.0.1:50002".parse().unwrap(),
            "127.0.0.1:4444".parse().unwrap(),
        );
        client.start().unwrap();

        let forged = Message::new(
            MessageKind::PubKeyResponse,
            creds.encryption_key.public_key().to_der().unwrap(),
        );
        let wire = seal_message(&forged, Sealing::Signed(&impostor)).unwrap();
        let err = client.receive(&unframe(&wire)).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(client.state(), HandshakeState::AwaitingServerKey);
    }

    #[test]
    fn test_changed_commitment_warns() {
        let mut pair = Pair::new();
        let hello = pair.client.start().unwrap();
        pair.deliver(&hello);

        let key = pair.server.session_key().unwrap().clone();
        let second = Message::text("a____").with_commitment(vec![7u8; 32]);
        let wire = seal_message(&second, Sealing::Aead(&key)).unwrap();
        let actions = pair.client.receive(&unframe(&wire)).unwrap();
        assert!(matches!(actions[0], ClientAction::TamperWarning(_)));
        assert_eq!(actions[1], ClientAction::Hint("a____".to_string()));
    }
}
