// ============================================
// File: crates/wordguard-core/src/protocol/messages.rs
// ============================================
//! # Protocol Message Definitions
//!
//! ## Creation Reason
//! Defines the two records exchanged between wordguard peers: the
//! plaintext `Message` and the `Envelope` that carries it on the wire.
//!
//! ## Main Functionality
//! - `MessageKind`: handshake and game control tags
//! - `Message`: kind + content + optional commitment
//! - `Envelope`: ciphertext + tag (AEAD nonce or RSA-PSS signature)
//!
//! ## JSON Shape
//! ```text
//! Envelope { "ciphertext": b64, "tag": b64 }
//! Message  { "kind": "PubKeyRequest" | ..., "content": b64, "commitment": b64 }
//! ```
//! Every field is optional on the wire and decodes to an empty value.
//!
//! ## ⚠️ Important Note for Next Developer
//! - `kind` decides how `content` is read; never sniff content to guess
//!   what a message is
//! - Kind names are part of the wire format, renaming a variant needs
//!   `#[serde(rename)]`
//!
//! ## Last Modified
//! v0.1.0 - Initial message definitions

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

// ============================================
// Constants
// ============================================

/// Content the client sends once the session key is in place.
pub const START_GAME: &str = "START GAME";

// ============================================
// MessageKind
// ============================================

/// Tag identifying the role of a [`Message`].
///
/// | Kind | Direction | Content |
/// |------|-----------|---------|
/// | PubKeyRequest | client → server | client public key (SPKI DER) |
/// | PubKeyResponse | server → client | server public key (SPKI DER) |
/// | SymKeyRequest | client → server | empty |
/// | SymKeyResponse | server → client | 32-byte session key |
/// | Application | either | game text |
/// | GameOver | server → client | score as decimal text |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// Client offers its public key.
    PubKeyRequest,
    /// Server answers with its public key, signed.
    PubKeyResponse,
    /// Client asks for a session key.
    SymKeyRequest,
    /// Server delivers the session key.
    SymKeyResponse,
    /// Explicitly tagged game text.
    Application,
    /// Game finished, content is the score.
    GameOver,
}

impl MessageKind {
    /// Returns the wire name of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PubKeyRequest => "PubKeyRequest",
            Self::PubKeyResponse => "PubKeyResponse",
            Self::SymKeyRequest => "SymKeyRequest",
            Self::SymKeyResponse => "SymKeyResponse",
            Self::Application => "Application",
            Self::GameOver => "GameOver",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Renders an optional kind for logs and errors.
#[must_use]
pub fn kind_name(kind: Option<MessageKind>) -> &'static str {
    kind.map_or("untagged", |k| k.as_str())
}

// ============================================
// Message
// ============================================

/// Plaintext application record.
///
/// # Example
/// ```
/// use wordguard_core::protocol::{Message, MessageKind};
///
/// let msg = Message::new(MessageKind::GameOver, "48");
/// assert_eq!(msg.content_str().unwrap(), "48");
/// assert!(msg.commitment.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message, `None` for a bare game turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<MessageKind>,

    /// Payload, interpreted according to `kind`.
    #[serde(default, with = "base64_bytes", skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<u8>,

    /// Game commitment, present on the first hint and on confirmed guesses.
    #[serde(default, with = "base64_bytes", skip_serializing_if = "Vec::is_empty")]
    pub commitment: Vec<u8>,
}

impl Message {
    /// Creates a tagged message.
    pub fn new(kind: MessageKind, content: impl Into<Vec<u8>>) -> Self {
        Self {
            kind: Some(kind),
            content: content.into(),
            commitment: Vec::new(),
        }
    }

    /// Creates an untagged game-text message.
    pub fn text(content: impl Into<Vec<u8>>) -> Self {
        Self {
            kind: None,
            content: content.into(),
            commitment: Vec::new(),
        }
    }

    /// Attaches a commitment value.
    #[must_use]
    pub fn with_commitment(mut self, commitment: impl Into<Vec<u8>>) -> Self {
        self.commitment = commitment.into();
        self
    }

    /// Checks if this is game text (untagged or `Application`).
    #[must_use]
    pub const fn is_game_text(&self) -> bool {
        matches!(self.kind, None | Some(MessageKind::Application))
    }

    /// Returns the content as UTF-8.
    ///
    /// # Errors
    /// `MalformedEnvelope` if the content is not valid UTF-8.
    pub fn content_str(&self) -> Result<&str> {
        std::str::from_utf8(&self.content)
            .map_err(|_| CoreError::malformed("message content is not UTF-8"))
    }
}

// ============================================
// Envelope
// ============================================

/// Wire unit: one serialized `Message`, possibly encrypted, plus its tag.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Serialized message, plain or encrypted depending on session phase.
    #[serde(default, with = "base64_bytes", skip_serializing_if = "Vec::is_empty")]
    pub ciphertext: Vec<u8>,

    /// AEAD nonce in the symmetric phase, signature before it, or empty.
    #[serde(default, with = "base64_bytes", skip_serializing_if = "Vec::is_empty")]
    pub tag: Vec<u8>,
}

impl Envelope {
    /// Creates an envelope without a tag.
    #[must_use]
    pub fn plain(ciphertext: Vec<u8>) -> Self {
        Self {
            ciphertext,
            tag: Vec::new(),
        }
    }

    /// Creates an envelope with a tag.
    #[must_use]
    pub fn tagged(ciphertext: Vec<u8>, tag: Vec<u8>) -> Self {
        Self { ciphertext, tag }
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("ciphertext_len", &self.ciphertext.len())
            .field("tag_len", &self.tag.len())
            .finish()
    }
}

// ============================================
// Base64 serde helper
// ============================================

/// Serializes byte strings as standard padded base64; `null` or a
/// missing field reads as empty.
pub(crate) mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) => BASE64.decode(s.as_bytes()).map_err(serde::de::Error::custom),
            None => Ok(Vec::new()),
        }
    }
}

// ============================================
// Tests
// ============================================
