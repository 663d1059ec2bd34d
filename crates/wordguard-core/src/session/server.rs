// ============================================
// File: crates/wordguard-core/src/session/server.rs
// ============================================
//! # Server Session Dispatcher
//!
//! ## Creation Reason
//! Owns the protocol state of one accepted connection: it opens each
//! inbound envelope according to the current phase, advances the
//! handshake, forwards game text to the game engine and produces the
//! framed replies for the connection's write task.
//!
//! ## Main Logical Flow
//! 1. `PubKeyRequest` (plain): store client key, reply `PubKeyResponse`
//!    with the encryption key, plain and signed by the leaf key
//! 2. `SymKeyRequest` (RSA): create a session key, reply
//!    `SymKeyResponse` RSA-encrypted for the client and signed
//! 3. `"START GAME"` (AEAD): start a game, reply first hint + commitment
//! 4. Guesses (AEAD): reply hint, rejection text or `GameOver`
//!
//! ## ⚠️ Important Note for Next Developer
//! - All state here belongs to one connection; nothing is shared except
//!   the read-only `ServerCredentials`
//! - Returned errors are classified by the caller: `is_fatal()` closes
//!   the connection, `is_soft()` drops the message

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, trace, warn};

use wordguard_common::time::MinuteStamp;

use crate::crypto::commitment::Commitment;
use crate::crypto::keys::{PublicKey, SessionKey};
use crate::error::{CoreError, Result};
use crate::protocol::codec::{decode_envelope, decode_message};
use crate::protocol::messages::{kind_name, Message, MessageKind, START_GAME};
use crate::session::game::{GameEngine, TurnOutcome};
use crate::session::state::{seal_message, CryptoPhase, HandshakeState, Sealing};
use crate::trust::store::ServerCredentials;

/// Server side of one connection.
pub struct ServerSession<G> {
    credentials: Arc<ServerCredentials>,
    game: G,
    client_addr: SocketAddr,
    server_addr: SocketAddr,
    state: HandshakeState,
    phase: CryptoPhase,
    commitment: Option<Commitment>,
    commitment_confirmed: bool,
}

impl<G: GameEngine> ServerSession<G> {
    /// Creates the session for a freshly accepted connection.
    pub fn new(
        credentials: Arc<ServerCredentials>,
        game: G,
        client_addr: SocketAddr,
        server_addr: SocketAddr,
    ) -> Self {
        Self {
            credentials,
            game,
            client_addr,
            server_addr,
            state: HandshakeState::AwaitingClientKey,
            phase: CryptoPhase::Unencrypted,
            commitment: None,
            commitment_confirmed: false,
        }
    }

    /// Current handshake state.
    #[must_use]
    pub const fn state(&self) -> HandshakeState {
        self.state
    }

    /// Current crypto phase.
    #[must_use]
    pub const fn phase(&self) -> &CryptoPhase {
        &self.phase
    }

    /// Negotiated session key, if any.
    #[must_use]
    pub const fn session_key(&self) -> Option<&SessionKey> {
        self.phase.session_key()
    }

    /// The game engine.
    #[must_use]
    pub const fn game(&self) -> &G {
        &self.game
    }

    /// Whether the client echoed the commitment of the current game, or
    /// of the game that just finished.
    #[must_use]
    pub const fn commitment_confirmed(&self) -> bool {
        self.commitment_confirmed
    }

    /// Processes one inbound frame body and returns framed replies.
    ///
    /// # Errors
    /// Soft (`MalformedEnvelope`, `UnexpectedMessage`) or fatal
    /// (`Decryption`, `Authentication`, crypto failures) errors.
    pub fn receive(&mut self, frame: &[u8]) -> Result<Vec<Bytes>> {
        let envelope = decode_envelope(frame)?;
        let plaintext = self.phase.open(&envelope, &self.credentials.encryption_key)?;
        let msg = decode_message(&plaintext)?;
        trace!(
            peer = %self.client_addr,
            kind = kind_name(msg.kind),
            phase = self.phase.name(),
            "Inbound message"
        );

        match (msg.kind, self.state) {
            (Some(MessageKind::PubKeyRequest), HandshakeState::AwaitingClientKey) => {
                self.on_pub_key_request(&msg)
            }
            (Some(MessageKind::SymKeyRequest), HandshakeState::AwaitingSessionKey) => {
                self.on_sym_key_request()
            }
            (_, HandshakeState::Established) if msg.is_game_text() => self.on_game_text(&msg),
            (kind, state) => Err(CoreError::unexpected(kind_name(kind), state.as_str())),
        }
    }

    fn on_pub_key_request(&mut self, msg: &Message) -> Result<Vec<Bytes>> {
        let peer_key = PublicKey::from_der(&msg.content)
            .map_err(|e| CoreError::malformed(format!("client public key: {e}")))?;
        debug!(peer = %self.client_addr, key = ?peer_key, "Client public key received");

        let reply = Message::new(
            MessageKind::PubKeyResponse,
            self.credentials.encryption_key.public_key().to_der()?,
        );
        let frame = seal_message(&reply, Sealing::Signed(&self.credentials.signing_key))?;

        self.phase = CryptoPhase::Asymmetric { peer_key };
        self.state = HandshakeState::AwaitingSessionKey;
        Ok(vec![frame])
    }

    fn on_sym_key_request(&mut self) -> Result<Vec<Bytes>> {
        let CryptoPhase::Asymmetric { peer_key } = &self.phase else {
            return Err(CoreError::invalid_state("SymKeyResponse", "Asymmetric phase"));
        };

        let key = SessionKey::generate();
        let reply = Message::new(MessageKind::SymKeyResponse, key.as_bytes().to_vec());
        let frame = seal_message(
            &reply,
            Sealing::EncryptedSigned {
                recipient: peer_key,
                signer: &self.credentials.signing_key,
            },
        )?;

        self.phase = CryptoPhase::Symmetric(key);
        self.state = HandshakeState::Established;
        info!(peer = %self.client_addr, "Session established");
        Ok(vec![frame])
    }

    fn on_game_text(&mut self, msg: &Message) -> Result<Vec<Bytes>> {
        let content = msg.content_str()?;

        if !self.game.is_active() {
            if content != START_GAME {
                return Err(CoreError::unexpected("guess", "no game in progress"));
            }
            return self.start_game();
        }

        if content.is_empty() {
            return Err(CoreError::malformed("empty guess"));
        }
        if !msg.commitment.is_empty() {
            self.check_client_commitment(&msg.commitment);
        }

        let reply = match self.game.process(content) {
            TurnOutcome::Hint(hint) => Message::text(hint),
            TurnOutcome::Rejected(text) => Message::text(text),
            TurnOutcome::Finished { score } => {
                info!(
                    peer = %self.client_addr,
                    score,
                    confirmed = self.commitment_confirmed,
                    "Game finished"
                );
                self.commitment = None;
                Message::new(MessageKind::GameOver, score.to_string())
            }
        };
        self.seal_aead(&reply).map(|frame| vec![frame])
    }

    fn start_game(&mut self) -> Result<Vec<Bytes>> {
        let hint = self.game.start();
        let commitment = Commitment::compute(
            &MinuteStamp::now(),
            self.game.answer(),
            &self.client_addr,
            &self.server_addr,
        );
        debug!(peer = %self.client_addr, commitment = ?commitment, "Game started");

        let reply = Message::text(hint).with_commitment(commitment.as_bytes().to_vec());
        self.commitment = Some(commitment);
        self.commitment_confirmed = false;
        self.seal_aead(&reply).map(|frame| vec![frame])
    }

    fn check_client_commitment(&mut self, received: &[u8]) {
        match &self.commitment {
            Some(ours) if ours.matches(received) => {
                debug!(peer = %self.client_addr, "Client confirmed game commitment");
                self.commitment_confirmed = true;
            }
            _ => warn!(peer = %self.client_addr, "Client sent a commitment that does not match"),
        }
    }

    fn seal_aead(&self, msg: &Message) -> Result<Bytes> {
        let key = self
            .phase
            .session_key()
            .ok_or_else(|| CoreError::invalid_state("seal game message", "Symmetric phase"))?;
        seal_message(msg, Sealing::Aead(key))
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::asymmetric::{verify_signature, AsymmetricCrypto, DefaultAsymmetricCrypto};
    use crate::crypto::keys::RsaKeyPair;
    use crate::protocol::frame::FrameDecoder;
    use crate::protocol::messages::Envelope;
    use crate::trust::store::TrustOptions;

    struct FixedGame {
        active: bool,
    }

    impl GameEngine for FixedGame {
        fn start(&mut self) -> String {
            self.active = true;
            "_____".to_string()
        }

        fn answer(&self) -> &str {
            "apple"
        }

        fn process(&mut self, guess: &str) -> TurnOutcome {
            if guess == "apple" {
                self.active = false;
                TurnOutcome::Finished { score: 48 }
            } else {
                TurnOutcome::Hint("a____".to_string())
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

    fn open_envelope(wire: &Bytes) -> Envelope {
        decode_envelope(&unframe(wire)).unwrap()
    }

    struct Harness {
        credentials: Arc<ServerCredentials>,
        client_key: RsaKeyPair,
        session: ServerSession<FixedGame>,
    }

    fn harness() -> Harness {
        let credentials = Arc::new(ServerCredentials::generate(&TrustOptions::default()).unwrap());
        let session = ServerSession::new(
            Arc::clone(&credentials),
            FixedGame { active: false },
            "127.0.0.1:50000".parse().unwrap(),
            "127.0.0.1:4444".parse().unwrap(),
        );
        Harness {
            credentials,
            client_key: RsaKeyPair::generate().unwrap(),
            session,
        }
    }

    /// Runs both handshake steps and returns the session key.
    fn establish(h: &mut Harness) -> SessionKey {
        let request = Message::new(MessageKind::PubKeyRequest, h.client_key.public_key().to_der().unwrap());
        let replies = h
            .session
            .receive(&unframe(&seal_message(&request, Sealing::Plain).unwrap()))
            .unwrap();
        assert_eq!(replies.len(), 1);
        let env = open_envelope(&replies[0]);
        verify_signature(h.credentials.signing_key.public_key(), &env.ciphertext, &env.tag).unwrap();
        let response = decode_message(&env.ciphertext).unwrap();
        assert_eq!(response.kind, Some(MessageKind::PubKeyResponse));
        let server_key = PublicKey::from_der(&response.content).unwrap();
        assert_eq!(&server_key, h.credentials.encryption_key.public_key());

        let request = Message::new(MessageKind::SymKeyRequest, Vec::new());
        let replies = h
            .session
            .receive(&unframe(&seal_message(&request, Sealing::Encrypted(&server_key)).unwrap()))
            .unwrap();
        let env = open_envelope(&replies[0]);
        verify_signature(h.credentials.signing_key.public_key(), &env.ciphertext, &env.tag).unwrap();
        let plain = DefaultAsymmetricCrypto.decrypt(&h.client_key, &env.ciphertext).unwrap();
        let response = decode_message(&plain).unwrap();
        assert_eq!(response.kind, Some(MessageKind::SymKeyResponse));
        SessionKey::from_slice(&response.content).unwrap()
    }

    fn send_text(h: &mut Harness, key: &SessionKey, msg: &Message) -> Message {
        let replies = h
            .session
            .receive(&unframe(&seal_message(msg, Sealing::Aead(key)).unwrap()))
            .unwrap();
        assert_eq!(replies.len(), 1);
        let env = open_envelope(&replies[0]);
        assert_eq!(env.tag.len(), 12);
        decode_message(&crate::crypto::transport::open(key, &env.ciphertext, &env.tag).unwrap()).unwrap()
    }

    #[test]
    fn test_handshake_reaches_established() {
        let mut h = harness();
        assert_eq!(h.session.state(), HandshakeState::AwaitingClientKey);

        let key = establish(&mut h);
        assert_eq!(h.session.state(), HandshakeState::Established);
        assert_eq!(h.session.session_key(), Some(&key));
        assert_eq!(h.session.phase().name(), "Symmetric");
    }

    #[test]
    fn test_game_round_trip() {
        let mut h = harness();
        let key = establish(&mut h);

        let first = send_text(&mut h, &key, &Message::text(START_GAME));
        assert_eq!(first.kind, None);
        assert_eq!(first.content_str().unwrap(), "_____");
        assert_eq!(first.commitment.len(), 32);
        assert!(h.session.game().is_active());

        let hint = send_text(&mut h, &key, &Message::text("a").with_commitment(first.commitment.clone()));
        assert_eq!(hint.content_str().unwrap(), "a____");
        assert!(hint.commitment.is_empty());
        assert!(h.session.commitment_confirmed());

        let over = send_text(&mut h, &key, &Message::text("apple"));
        assert_eq!(over.kind, Some(MessageKind::GameOver));
        assert_eq!(over.content_str().unwrap(), "48");
        assert!(!h.session.game().is_active());
        assert!(h.session.commitment_confirmed());

        let again = send_text(&mut h, &key, &Message::text(START_GAME));
        assert_eq!(again.commitment.len(), 32);
        assert!(!h.session.commitment_confirmed());
    }

    #[test]
    fn test_wrong_commitment_is_not_fatal() {
        let mut h = harness();
        let key = establish(&mut h);
        send_text(&mut h, &key, &Message::text(START_GAME));

        let hint = send_text(&mut h, &key, &Message::text("p").with_commitment(vec![0u8; 32]));
        assert_eq!(hint.content_str().unwrap(), "a____");
        assert!(!h.session.commitment_confirmed());
    }

    #[test]
    fn test_out_of_order_messages_are_soft() {
        let mut h = harness();

        let early = Message::new(MessageKind::SymKeyRequest, Vec::new());
        let err = h
            .session
            .receive(&unframe(&seal_message(&early, Sealing::Plain).unwrap()))
            .unwrap_err();
        assert!(err.is_soft());
        assert_eq!(h.session.state(), HandshakeState::AwaitingClientKey);

        let key = establish(&mut h);
        let err = h
            .session
            .receive(&unframe(&seal_message(&Message::text("a"), Sealing::Aead(&key)).unwrap()))
            .unwrap_err();
        assert!(err.is_soft());
    }

    #[test]
    fn test_garbage_is_soft_and_bad_key_is_soft() {
        let mut h = harness();
        assert!(h.session.receive(b"not json").unwrap_err().is_soft());

        let bad = Message::new(MessageKind::PubKeyRequest, vec![1, 2, 3]);
        let err = h
            .session
            .receive(&unframe(&seal_message(&bad, Sealing::Plain).unwrap()))
            .unwrap_err();
        assert!(err.is_soft());
        assert_eq!(h.session.state(), HandshakeState::AwaitingClientKey);
    }

    #[test]
    fn test_tampered_ciphertext_is_fatal() {
        let mut h = harness();
        let key = establish(&mut h);

        let wire = seal_message(&Message::text(START_GAME), Sealing::Aead(&key)).unwrap();
        let mut env = open_envelope(&wire);
        env.ciphertext[0] ^= 0x01;
        let body = crate::protocol::codec::encode_envelope(&env).unwrap();

        let err = h.session.receive(&body).unwrap_err();
        assert!(err.is_fatal());
        assert!(!h.session.game().is_active());
    }
}
