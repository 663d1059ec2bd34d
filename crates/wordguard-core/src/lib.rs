// ============================================
// File: crates/wordguard-core/src/lib.rs
// ============================================
//! # Wordguard Core - Secure Session Protocol
//!
//! ## Creation Reason
//! Holds everything both binaries share about the wire: the message and
//! envelope codec, length-prefixed framing, the RSA and AEAD providers,
//! the game commitment, certificates, and the per-connection session
//! dispatchers for each role.
//!
//! ## Main Functionality
//!
//! ### Protocol Module ([`protocol`])
//! - `Message` / `Envelope` records and their JSON codec
//! - 2-byte length-prefixed framing with an incremental decoder
//!
//! ### Crypto Module ([`crypto`])
//! - RSA-OAEP and RSA-PSS (SHA-256) for the bootstrap
//! - ChaCha20-Poly1305 for the session phase
//! - SHA-256 game commitment
//!
//! ### Trust Module ([`trust`])
//! - Root authority and leaf certificates, server trust directory
//! - Client-side certificate loading and pinning
//!
//! ### Session Module ([`session`])
//! - `ServerSession` and `ClientSession` state machines
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │     wordguard-server          wordguard-client      │
//! │              │                      │               │
//! │              └──────────┬───────────┘               │
//! │                         ▼                           │
//! │                wordguard-transport                  │
//! │                         │                           │
//! │                         ▼                           │
//! │                 wordguard-core   ◄── You are here   │
//! │                         │                           │
//! │                         ▼                           │
//! │                wordguard-common                     │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Properties
//! - **Confidentiality**: RSA-OAEP during bootstrap, AEAD afterwards
//! - **Authenticity**: server handshake envelopes are PSS-signed by the
//!   certificate key the client already holds
//! - **Answer binding**: the first hint carries a commitment to the answer
//!
//! ## ⚠️ Important Note for Next Developer
//! - No I/O happens in this crate except trust file handling; sockets live
//!   in `wordguard-transport`
//! - Session keys implement Zeroize
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod crypto;
pub mod error;
pub mod protocol;
pub mod session;
pub mod trust;

// Re-export commonly used items
pub use crypto::{Commitment, PublicKey, RsaKeyPair, SessionKey};
pub use error::{CoreError, Result};
pub use protocol::{Envelope, FrameDecoder, Message, MessageKind, START_GAME};
pub use session::{ClientAction, ClientSession, GameEngine, ServerSession, TurnOutcome};
pub use trust::{ServerCredentials, ServerIdentity};
