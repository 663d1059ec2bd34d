// ============================================
// File: crates/wordguard-core/src/crypto/asymmetric.rs
// ============================================
//! # Asymmetric Cryptography
//!
//! ## Creation Reason
//! The handshake has no shared secret yet, so its envelopes are protected
//! with RSA: OAEP for confidentiality, PSS for server authenticity.
//!
//! ## Main Functionality
//! - `AsymmetricCrypto`: Trait for the four RSA operations
//! - `DefaultAsymmetricCrypto`: OAEP-SHA256 / PSS-SHA256 implementation
//!
//! ## Signature Construction
//! ```text
//! tag = RSA-PSS-sign(private, SHA-256(envelope.ciphertext))
//! ```
//! The salt length equals the digest length.
//!
//! ## ⚠️ Important Note for Next Developer
//! - OAEP plaintext is bounded by `k - 2*hLen - 2` = 190 bytes for a
//!   2048-bit key; only handshake artifacts fit
//! - Decryption never returns partial output
//!
//! ## Last Modified
//! v0.1.0 - Initial RSA provider

use rand::rngs::OsRng;
use rsa::{Oaep, Pss};
use sha2::{Digest, Sha256};

use crate::crypto::keys::{PublicKey, RsaKeyPair};
use crate::error::{CoreError, Result};

// ============================================
// AsymmetricCrypto Trait
// ============================================

/// Trait for RSA operations used during the handshake.
pub trait AsymmetricCrypto: Send + Sync {
    /// Encrypts `plaintext` for the holder of `key` (OAEP, SHA-256).
    ///
    /// # Errors
    /// `Encryption` if the plaintext is too long for the key.
    fn encrypt(&self, key: &PublicKey, plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Decrypts an OAEP ciphertext.
    ///
    /// # Errors
    /// `Decryption` on any padding or format mismatch.
    fn decrypt(&self, key: &RsaKeyPair, ciphertext: &[u8]) -> Result<Vec<u8>>;

    /// Signs SHA-256(`message`) with PSS.
    ///
    /// # Errors
    /// `SignatureCreation` if the backend fails.
    fn sign(&self, key: &RsaKeyPair, message: &[u8]) -> Result<Vec<u8>>;

    /// Verifies a PSS signature over SHA-256(`message`).
    fn verify(&self, key: &PublicKey, message: &[u8], signature: &[u8]) -> bool;
}

// ============================================
// DefaultAsymmetricCrypto
// ============================================

/// Default implementation backed by the `rsa` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultAsymmetricCrypto;

impl DefaultAsymmetricCrypto {
    /// Creates a new instance.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl AsymmetricCrypto for DefaultAsymmetricCrypto {
    fn encrypt(&self, key: &PublicKey, plaintext: &[u8]) -> Result<Vec<u8>> {
        key.as_rsa()
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), plaintext)
            .map_err(|e| CoreError::encryption(format!("RSA-OAEP: {e}")))
    }

    fn decrypt(&self, key: &RsaKeyPair, ciphertext: &[u8]) -> Result<Vec<u8>> {
        key.private_key()
            .decrypt(Oaep::new::<Sha256>(), ciphertext)
            .map_err(|_| CoreError::Decryption)
    }

    fn sign(&self, key: &RsaKeyPair, message: &[u8]) -> Result<Vec<u8>> {
        let digest = Sha256::digest(message);
        key.private_key()
            .sign_with_rng(&mut OsRng, Pss::new::<Sha256>(), &digest)
            .map_err(|e| CoreError::SignatureCreation {
                reason: e.to_string(),
            })
    }

    fn verify(&self, key: &PublicKey, message: &[u8], signature: &[u8]) -> bool {
        let digest = Sha256::digest(message);
        key.as_rsa()
            .verify(Pss::new::<Sha256>(), &digest, signature)
            .is_ok()
    }
}

// ============================================
// Convenience Functions
// ============================================

/// Verifies a signature, mapping failure to `SignatureVerification`.
///
/// # Errors
/// `SignatureVerification` if the signature does not match.
pub fn verify_signature(key: &PublicKey, message: &[u8], signature: &[u8]) -> Result<()> {
    if DefaultAsymmetricCrypto.verify(key, message, signature) {
        Ok(())
    } else {
        Err(CoreError::SignatureVerification)
    }
}

// ============================================
// Tests
// ============================================
