// ============================================
// File: crates/wordguard-core/src/protocol/codec.rs
// ============================================
//! # Protocol Codec
//!
//! ## Creation Reason
//! Turns `Message` and `Envelope` values into the self-describing JSON
//! byte form exchanged on the wire, and back.
//!
//! ## Main Functionality
//! - `Codec` trait: Generic encode/decode interface
//! - `JsonCodec`: Implementation for both records
//! - `encode_*` / `decode_*` convenience functions
//!
//! ## Parsing Strategy
//! 1. The frame layer has already bounded the input size
//! 2. Parse as a JSON object; absent fields become empty
//! 3. Any parse failure is reported as `MalformedEnvelope`
//!
//! ## ⚠️ Important Note for Next Developer
//! - Decode failures are soft: the dispatcher drops the record and keeps
//!   the connection
//!
//! ## Last Modified
//! v0.1.0 - Initial codec implementation

use bytes::{BufMut, Bytes, BytesMut};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{CoreError, Result};
use crate::protocol::messages::{Envelope, Message};

// ============================================
// Codec Trait
// ============================================

/// Trait for encoding and decoding protocol records.
///
/// # Type Parameters
/// * `T` - The record type to encode/decode
pub trait Codec<T> {
    /// Encodes a record into a byte buffer.
    ///
    /// # Errors
    /// `MalformedEnvelope` if the record cannot be serialized.
    fn encode(&self, msg: &T, buf: &mut BytesMut) -> Result<()>;

    /// Decodes a record from bytes.
    ///
    /// # Errors
    /// `MalformedEnvelope` if the bytes are not a well-formed record.
    fn decode(&self, buf: &mut Bytes) -> Result<T>;
}

// ============================================
// JsonCodec
// ============================================

/// JSON codec for every protocol record.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl JsonCodec {
    fn write<T: Serialize>(value: &T, what: &str, buf: &mut BytesMut) -> Result<()> {
        serde_json::to_writer(buf.writer(), value)
            .map_err(|e| CoreError::malformed(format!("{what} encode: {e}")))
    }

    fn read<T: DeserializeOwned>(buf: &mut Bytes, what: &str) -> Result<T> {
        let value = serde_json::from_slice(&buf[..])
            .map_err(|e| CoreError::malformed(format!("{what}: {e}")))?;
        buf.clear();
        Ok(value)
    }
}

impl Codec<Message> for JsonCodec {
    fn encode(&self, msg: &Message, buf: &mut BytesMut) -> Result<()> {
        Self::write(msg, "message", buf)
    }

    fn decode(&self, buf: &mut Bytes) -> Result<Message> {
        Self::read(buf, "message")
    }
}

impl Codec<Envelope> for JsonCodec {
    fn encode(&self, msg: &Envelope, buf: &mut BytesMut) -> Result<()> {
        Self::write(msg, "envelope", buf)
    }

    fn decode(&self, buf: &mut Bytes) -> Result<Envelope> {
        Self::read(buf, "envelope")
    }
}

// ============================================
// Convenience Functions
// ============================================

/// Encodes a `Message` to bytes.
///
/// # Errors
/// See [`Codec::encode`].
pub fn encode_message(msg: &Message) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(64 + msg.content.len() * 2);
    JsonCodec.encode(msg, &mut buf)?;
    Ok(buf.freeze())
}

/// Decodes a `Message` from bytes.
///
/// # Errors
/// See [`Codec::decode`].
pub fn decode_message(buf: &[u8]) -> Result<Message> {
    let mut bytes = Bytes::copy_from_slice(buf);
    JsonCodec.decode(&mut bytes)
}

/// Encodes an `Envelope` to bytes.
///
/// # Errors
/// See [`Codec::encode`].
pub fn encode_envelope(env: &Envelope) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(32 + (env.ciphertext.len() + env.tag.len()) * 2);
    JsonCodec.encode(env, &mut buf)?;
    Ok(buf.freeze())
}

/// Decodes an `Envelope` from bytes.
///
/// # Errors
/// See [`Codec::decode`].
pub fn decode_envelope(buf: &[u8]) -> Result<Envelope> {
    let mut bytes = Bytes::copy_from_slice(buf);
    JsonCodec.decode(&mut bytes)
}

// ============================================
// Tests
// ============================================
