// ============================================
// File: crates/wordguard-core/src/session/state.rs
// ============================================
//! # Session State
//!
//! ## Creation Reason
//! Both roles track two things per connection: how far the handshake
//! has progressed, and which protection applies to envelopes. Keeping
//! them as explicit enums lets every dispatch decision be an exhaustive
//! `match` instead of a check on empty fields.
//!
//! ## Main Functionality
//! - `HandshakeState`: position in the key-exchange sequence
//! - `CryptoPhase`: Unencrypted → Asymmetric → Symmetric(key)
//! - `Sealing` + `seal_message`: outbound envelope construction
//!
//! ## Phase Transitions
//! ```text
//! Unencrypted ──(peer public key known)──► Asymmetric { peer_key }
//! Asymmetric  ──(session key delivered)──► Symmetric(key)
//! ```
//! There is no way back; a connection never leaves `Symmetric`.

use std::fmt;

use bytes::Bytes;

use crate::crypto::asymmetric::{AsymmetricCrypto, DefaultAsymmetricCrypto};
use crate::crypto::keys::{PublicKey, RsaKeyPair, SessionKey};
use crate::crypto::transport;
use crate::error::Result;
use crate::protocol::codec::{encode_envelope, encode_message};
use crate::protocol::frame::encode_frame;
use crate::protocol::messages::{Envelope, Message};

// ============================================
// HandshakeState
// ============================================

/// Position of a connection in the handshake.
///
/// ```text
/// client: Init → AwaitingServerKey → AwaitingSessionKey → Established
/// server:        AwaitingClientKey → AwaitingSessionKey → Established
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandshakeState {
    /// Nothing sent yet.
    Init,
    /// Client sent its key, waits for the server's.
    AwaitingServerKey,
    /// Server waits for the client's key.
    AwaitingClientKey,
    /// Public keys exchanged, session key outstanding.
    AwaitingSessionKey,
    /// Session key in place.
    Established,
}

impl HandshakeState {
    /// Returns the state name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "Init",
            Self::AwaitingServerKey => "AwaitingServerKey",
            Self::AwaitingClientKey => "AwaitingClientKey",
            Self::AwaitingSessionKey => "AwaitingSessionKey",
            Self::Established => "Established",
        }
    }
}

impl fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================
// CryptoPhase
// ============================================

/// Protection applied to inbound envelopes.
#[derive(Debug, Clone, Default)]
pub enum CryptoPhase {
    /// No keys exchanged; envelopes carry plaintext.
    #[default]
    Unencrypted,
    /// Peer public key known; envelopes are RSA-OAEP encrypted.
    Asymmetric {
        /// The peer's RSA public key
        peer_key: PublicKey,
    },
    /// Session key in place; envelopes are AEAD sealed.
    Symmetric(SessionKey),
}

impl CryptoPhase {
    /// Returns the phase name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Unencrypted => "Unencrypted",
            Self::Asymmetric { .. } => "Asymmetric",
            Self::Symmetric(_) => "Symmetric",
        }
    }

    /// Session key, once negotiated.
    #[must_use]
    pub const fn session_key(&self) -> Option<&SessionKey> {
        match self {
            Self::Symmetric(key) => Some(key),
            _ => None,
        }
    }

    /// Peer key, during the asymmetric phase.
    #[must_use]
    pub const fn peer_key(&self) -> Option<&PublicKey> {
        match self {
            Self::Asymmetric { peer_key } => Some(peer_key),
            _ => None,
        }
    }

    /// Recovers the serialized message carried by `envelope`.
    ///
    /// # Errors
    /// `Decryption` (asymmetric) or `Authentication` (AEAD), both fatal.
    pub fn open(&self, envelope: &Envelope, own_key: &RsaKeyPair) -> Result<Vec<u8>> {
        match self {
            Self::Unencrypted => Ok(envelope.ciphertext.clone()),
            Self::Asymmetric { .. } => DefaultAsymmetricCrypto.decrypt(own_key, &envelope.ciphertext),
            Self::Symmetric(key) => transport::open(key, &envelope.ciphertext, &envelope.tag),
        }
    }
}

// ============================================
// Outbound sealing
// ============================================

/// How an outbound message is protected.
#[derive(Clone, Copy)]
pub enum Sealing<'a> {
    /// Plaintext, no tag.
    Plain,
    /// Plaintext, tag = signature.
    Signed(&'a RsaKeyPair),
    /// RSA-OAEP for `0`, no tag.
    Encrypted(&'a PublicKey),
    /// RSA-OAEP for `recipient`, tag = signature by `signer`.
    EncryptedSigned {
        /// Key the message is encrypted for
        recipient: &'a PublicKey,
        /// Key signing the ciphertext
        signer: &'a RsaKeyPair,
    },
    /// ChaCha20-Poly1305, tag = nonce.
    Aead(&'a SessionKey),
}

/// Serializes, protects and frames a message for the wire.
///
/// # Errors
/// Encoding, encryption or signing failures.
pub fn seal_message(msg: &Message, sealing: Sealing<'_>) -> Result<Bytes> {
    let plaintext = encode_message(msg)?;
    let crypto = DefaultAsymmetricCrypto;

    let envelope = match sealing {
        Sealing::Plain => Envelope::plain(plaintext.to_vec()),
        Sealing::Signed(signer) => {
            let tag = crypto.sign(signer, &plaintext)?;
            Envelope::tagged(plaintext.to_vec(), tag)
        }
        Sealing::Encrypted(recipient) => Envelope::plain(crypto.encrypt(recipient, &plaintext)?),
        Sealing::EncryptedSigned { recipient, signer } => {
            let ciphertext = crypto.encrypt(recipient, &plaintext)?;
            let tag = crypto.sign(signer, &ciphertext)?;
            Envelope::tagged(ciphertext, tag)
        }
        Sealing::Aead(key) => {
            let (ciphertext, nonce) = transport::seal(key, &plaintext)?;
            Envelope::tagged(ciphertext, nonce.to_vec())
        }
    };

    encode_frame(&encode_envelope(&envelope)?)
}

// ============================================
// Tests
// ============================================
