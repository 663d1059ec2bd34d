// ============================================
// File: crates/wordguard-core/src/crypto/transport.rs
// ============================================
//! # Transport Encryption
//!
//! ## Creation Reason
//! Once the session key is delivered, every envelope is sealed with
//! ChaCha20-Poly1305 AEAD.
//!
//! ## Main Functionality
//! - `TransportCrypto`: Trait for seal/open
//! - `DefaultTransportCrypto`: Production implementation
//! - `seal` / `open` convenience functions
//!
//! ## Envelope Mapping
//! ```text
//! envelope.ciphertext = ChaCha20-Poly1305(key, nonce, message JSON) || tag
//! envelope.tag        = nonce (12 random bytes)
//! ```
//! No associated data is bound.
//!
//! ## ⚠️ Important Note for Next Developer
//! - Nonces are random per call. Never reuse a (key, nonce) pair
//! - A key seals far fewer than 2^32 messages per session; games end
//!   long before random-nonce collision becomes plausible
//! - `open` failure is fatal to the connection, never retry
//!
//! ## Last Modified
//! v0.1.0 - Initial transport crypto implementation

use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    ChaCha20Poly1305, Nonce,
};

use super::{CHACHA20_NONCE_SIZE, POLY1305_TAG_SIZE};
use crate::crypto::keys::SessionKey;
use crate::error::{CoreError, Result};

// ============================================
// Constants
// ============================================

/// Overhead added by encryption (auth tag).
pub const ENCRYPTION_OVERHEAD: usize = POLY1305_TAG_SIZE;

// ============================================
// TransportCrypto Trait
// ============================================

/// Trait for session-phase authenticated encryption.
pub trait TransportCrypto: Send + Sync {
    /// Seals `plaintext` under a fresh random nonce.
    ///
    /// # Returns
    /// `(ciphertext || tag, nonce)`
    ///
    /// # Errors
    /// - `Encryption`: If encryption fails (shouldn't happen with valid inputs)
    fn seal(&self, key: &SessionKey, plaintext: &[u8]) -> Result<(Vec<u8>, [u8; CHACHA20_NONCE_SIZE])>;

    /// Opens a sealed payload.
    ///
    /// # Errors
    /// - `Authentication`: If the tag does not verify (tampered, wrong
    ///   key, or malformed nonce)
    fn open(&self, key: &SessionKey, ciphertext: &[u8], nonce: &[u8]) -> Result<Vec<u8>>;
}

// ============================================
// DefaultTransportCrypto
// ============================================

/// Default implementation using ChaCha20-Poly1305.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultTransportCrypto;

impl DefaultTransportCrypto {
    fn cipher(key: &SessionKey) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(key.as_bytes().into())
    }
}

impl TransportCrypto for DefaultTransportCrypto {
    fn seal(&self, key: &SessionKey, plaintext: &[u8]) -> Result<(Vec<u8>, [u8; CHACHA20_NONCE_SIZE])> {
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = Self::cipher(key)
            .encrypt(&nonce, plaintext)
            .map_err(|_| CoreError::encryption("ChaCha20-Poly1305 seal failed"))?;
        let mut nonce_bytes = [0u8; CHACHA20_NONCE_SIZE];
        nonce_bytes.copy_from_slice(&nonce);
        Ok((ciphertext, nonce_bytes))
    }

    fn open(&self, key: &SessionKey, ciphertext: &[u8], nonce: &[u8]) -> Result<Vec<u8>> {
        if nonce.len() != CHACHA20_NONCE_SIZE || ciphertext.len() < ENCRYPTION_OVERHEAD {
            return Err(CoreError::Authentication);
        }
        Self::cipher(key)
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CoreError::Authentication)
    }
}

// ============================================
// Convenience Functions
// ============================================

/// Seals data using the default transport crypto.
///
/// # Errors
/// See [`TransportCrypto::seal`].
pub fn seal(key: &SessionKey, plaintext: &[u8]) -> Result<(Vec<u8>, [u8; CHACHA20_NONCE_SIZE])> {
    DefaultTransportCrypto.seal(key, plaintext)
}

/// Opens data using the default transport crypto.
///
/// # Errors
/// See [`TransportCrypto::open`].
pub fn open(key: &SessionKey, ciphertext: &[u8], nonce: &[u8]) -> Result<Vec<u8>> {
    DefaultTransportCrypto.open(key, ciphertext, nonce)
}

// ============================================
// Tests
// ============================================
