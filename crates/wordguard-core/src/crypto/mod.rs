// ============================================
// File: crates/wordguard-core/src/crypto/mod.rs
// ============================================
//! # Cryptography Module
//!
//! ## Creation Reason
//! Centralizes the cryptographic providers behind the wordguard
//! secure session, using audited RustCrypto implementations.
//!
//! ### Submodules
//! - [`keys`]: RSA key pairs, public keys and the symmetric `SessionKey`
//! - [`asymmetric`]: RSA-OAEP encryption and RSA-PSS signatures
//! - [`transport`]: ChaCha20-Poly1305 sealing with random nonces
//! - [`commitment`]: SHA-256 game commitment
//!
//! ## Cryptographic Design
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Bootstrap Phase                          │
//! │  Client                                        Server       │
//! │    │  RSA public key (plain) ─────────────────► │           │
//! │    │ ◄──────────── RSA public key + PSS(cert key)           │
//! │    │  SymKeyRequest, OAEP(server key) ─────────► │           │
//! │    │ ◄──── session key, OAEP(client key) + PSS(cert key)    │
//! └─────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Session Phase                            │
//! │   Session Key + random nonce ──► ChaCha20-Poly1305          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - NEVER roll your own crypto
//! - Symmetric keys implement Zeroize; `RsaPrivateKey` zeroizes itself
//!
//! ## Last Modified
//! v0.1.0 - Initial crypto implementation

pub mod asymmetric;
pub mod commitment;
pub mod keys;
pub mod transport;

// Re-export primary types at module level
pub use asymmetric::{AsymmetricCrypto, DefaultAsymmetricCrypto};
pub use commitment::Commitment;
pub use keys::{PublicKey, RsaKeyPair, SessionKey};
pub use transport::{DefaultTransportCrypto, TransportCrypto};

// ============================================
// Constants
// ============================================

/// RSA modulus size for every generated key.
pub const RSA_KEY_BITS: usize = 2048;

/// Size of ChaCha20-Poly1305 key in bytes.
pub const CHACHA20_KEY_SIZE: usize = 32;

/// Size of ChaCha20-Poly1305 nonce in bytes.
pub const CHACHA20_NONCE_SIZE: usize = 12;

/// Size of Poly1305 authentication tag in bytes.
pub const POLY1305_TAG_SIZE: usize = 16;

/// Size of a SHA-256 digest.
pub const SHA256_SIZE: usize = 32;
