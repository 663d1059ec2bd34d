// ============================================
// File: crates/wordguard-core/src/protocol/mod.rs
// ============================================
//! # Protocol Module
//!
//! ## Creation Reason
//! Defines the wordguard wire protocol: the records exchanged between
//! peers, their JSON encoding, and the length-prefixed framing that
//! carries them over TCP.
//!
//! ### Submodules
//! - [`messages`]: `Message`, `Envelope`, `MessageKind`
//! - [`codec`]: JSON serialization/deserialization
//! - [`frame`]: length prefix and incremental decoder
//!
//! ## Protocol Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Client ─── PubKeyRequest (plain) ──────────────────► Server│
//! │  Client ◄── PubKeyResponse (plain, signed) ────────── Server│
//! │  Client ─── SymKeyRequest (RSA-OAEP) ───────────────► Server│
//! │  Client ◄── SymKeyResponse (RSA-OAEP, signed) ─────── Server│
//! ├─────────────────────────────────────────────────────────────┤
//! │  Client ═══ "START GAME", guesses (AEAD) ═══════════► Server│
//! │  Client ◄══ hints, GameOver (AEAD) ══════════════════ Server│
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Handshake correctness depends on in-order delivery of frames
//!
//! ## Last Modified
//! v0.1.0 - Initial protocol definitions

pub mod codec;
pub mod frame;
pub mod messages;

// Re-export primary types
pub use codec::{decode_envelope, decode_message, encode_envelope, encode_message, Codec, JsonCodec};
pub use frame::{encode_frame, FrameDecoder, LENGTH_PREFIX_SIZE, MAX_FRAME_LENGTH, READ_CHUNK_SIZE};
pub use messages::{kind_name, Envelope, Message, MessageKind, START_GAME};
