// ============================================
// File: crates/wordguard-core/src/error.rs
// ============================================
//! # Core Error Types
//!
//! ## Creation Reason
//! Defines error types specific to the secure-session protocol: the RSA
//! and AEAD providers, the envelope codec and framing, the handshake
//! state machine, and trust bootstrap.
//!
//! ## Error Categories
//! 1. **Crypto Errors**: key handling, signing, encryption failures.
//!    Verification and decryption failures close the connection.
//! 2. **Protocol Errors**: malformed envelopes and out-of-order messages
//!    are soft; a broken length prefix is fatal.
//! 3. **Trust Errors**: unreadable credentials end the process at startup.
//!
//! ## ⚠️ Important Note for Next Developer
//! - NEVER include key material or the secret answer in error messages
//! - `is_fatal` drives connection teardown in both binaries; keep it in
//!   sync when adding variants
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use std::path::PathBuf;

use thiserror::Error;

// ============================================
// Result Type Alias
// ============================================

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

// ============================================
// CoreError
// ============================================

/// Core error types for protocol and cryptographic operations.
#[derive(Error, Debug)]
pub enum CoreError {
    // ========================================
    // Cryptographic Errors
    // ========================================

    /// Failed to generate cryptographic key.
    #[error("Key generation failed: {context}")]
    KeyGeneration {
        /// What key was being generated
        context: String,
    },

    /// A key could not be serialized or parsed.
    #[error("Key encoding failed: {context}")]
    KeyEncoding {
        /// Which key and format
        context: String,
    },

    /// Signature creation failed.
    #[error("Failed to create signature: {reason}")]
    SignatureCreation {
        /// Why signing failed
        reason: String,
    },

    /// Signature verification failed.
    #[error("Signature verification failed")]
    SignatureVerification,

    /// Encryption operation failed.
    #[error("Encryption failed: {context}")]
    Encryption {
        /// What was being encrypted
        context: String,
    },

    /// Asymmetric decryption failed (padding or format mismatch).
    #[error("Decryption failed")]
    Decryption,

    /// AEAD open failed: the ciphertext or nonce was altered, or the key
    /// is wrong.
    #[error("Authentication failed: AEAD tag mismatch")]
    Authentication,

    // ========================================
    // Protocol Errors
    // ========================================

    /// Envelope or message bytes are not a well-formed record.
    #[error("Malformed envelope: {reason}")]
    MalformedEnvelope {
        /// What's wrong with the record
        reason: String,
    },

    /// A length prefix announced more bytes than a frame may carry.
    #[error("Frame too large: max {max} bytes, got {actual}")]
    FrameTooLarge {
        /// Maximum allowed body size
        max: usize,
        /// Announced body size
        actual: usize,
    },

    /// A length prefix of zero.
    #[error("Empty frame")]
    EmptyFrame,

    /// A message arrived that the handshake does not expect in the
    /// current state.
    #[error("Unexpected {kind} message in state {state}")]
    UnexpectedMessage {
        /// Kind of the message received
        kind: String,
        /// Handshake state at the time
        state: String,
    },

    /// Operation not valid in current state.
    #[error("Invalid state for operation: {operation} requires {required_state}")]
    InvalidState {
        /// What operation was attempted
        operation: String,
        /// What state was required
        required_state: String,
    },

    // ========================================
    // Trust Errors
    // ========================================

    /// Credentials could not be loaded or created.
    #[error("Trust bootstrap failed for {}: {reason}", path.display())]
    TrustBootstrap {
        /// File or directory involved
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// A certificate failed validation.
    #[error("Untrusted certificate: {reason}")]
    UntrustedCertificate {
        /// Why it was rejected
        reason: String,
    },
}

impl CoreError {
    // ========================================
    // Convenience Constructors
    // ========================================

    /// Creates a `KeyGeneration` error.
    pub fn key_generation(context: impl Into<String>) -> Self {
        Self::KeyGeneration {
            context: context.into(),
        }
    }

    /// Creates a `KeyEncoding` error.
    pub fn key_encoding(context: impl Into<String>) -> Self {
        Self::KeyEncoding {
            context: context.into(),
        }
    }

    /// Creates an `Encryption` error.
    pub fn encryption(context: impl Into<String>) -> Self {
        Self::Encryption {
            context: context.into(),
        }
    }

    /// Creates a `MalformedEnvelope` error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedEnvelope {
            reason: reason.into(),
        }
    }

    /// Creates an `UnexpectedMessage` error.
    pub fn unexpected(kind: impl Into<String>, state: impl Into<String>) -> Self {
        Self::UnexpectedMessage {
            kind: kind.into(),
            state: state.into(),
        }
    }

    /// Creates an `InvalidState` error.
    pub fn invalid_state(
        operation: impl Into<String>,
        required_state: impl Into<String>,
    ) -> Self {
        Self::InvalidState {
            operation: operation.into(),
            required_state: required_state.into(),
        }
    }

    /// Creates a `TrustBootstrap` error.
    pub fn trust(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::TrustBootstrap {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates an `UntrustedCertificate` error.
    pub fn untrusted(reason: impl Into<String>) -> Self {
        Self::UntrustedCertificate {
            reason: reason.into(),
        }
    }

    // ========================================
    // Error Classification
    // ========================================

    /// Returns `true` if this is a cryptographic error.
    #[must_use]
    pub const fn is_crypto_error(&self) -> bool {
        matches!(
            self,
            Self::KeyGeneration { .. }
                | Self::KeyEncoding { .. }
                | Self::SignatureCreation { .. }
                | Self::SignatureVerification
                | Self::Encryption { .. }
                | Self::Decryption
                | Self::Authentication
        )
    }

    /// Returns `true` if the connection must be closed.
    ///
    /// Verification failures are never retried, and a bad length prefix
    /// leaves the stream unsynchronised.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        self.is_crypto_error()
            || matches!(
                self,
                Self::FrameTooLarge { .. }
                    | Self::EmptyFrame
                    | Self::TrustBootstrap { .. }
                    | Self::UntrustedCertificate { .. }
            )
    }

    /// Returns `true` if the message should be dropped and the
    /// connection kept open.
    #[must_use]
    pub const fn is_soft(&self) -> bool {
        matches!(
            self,
            Self::MalformedEnvelope { .. } | Self::UnexpectedMessage { .. }
        )
    }

    /// Returns `true` if this error might indicate an attack.
    #[must_use]
    pub const fn is_suspicious(&self) -> bool {
        matches!(
            self,
            Self::SignatureVerification
                | Self::Decryption
                | Self::Authentication
                | Self::UntrustedCertificate { .. }
        )
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::SignatureVerification;
        assert!(err.to_string().contains("Signature"));

        let err = CoreError::FrameTooLarge { max: 16384, actual: 60000 };
        assert!(err.to_string().contains("16384"));
        assert!(err.to_string().contains("60000"));

        let err = CoreError::unexpected("SymKeyRequest", "Init");
        assert_eq!(err.to_string(), "Unexpected SymKeyRequest message in state Init");
    }

    #[test]
    fn test_error_classification() {
        assert!(CoreError::Authentication.is_fatal());
        assert!(CoreError::Authentication.is_suspicious());
        assert!(CoreError::Decryption.is_crypto_error());
        assert!(CoreError::EmptyFrame.is_fatal());

        let soft = CoreError::malformed("not json");
        assert!(soft.is_soft());
        assert!(!soft.is_fatal());

        let order = CoreError::unexpected("PubKeyRequest", "Established");
        assert!(order.is_soft());
        assert!(!order.is_suspicious());
    }

    #[test]
    fn test_trust_error_path() {
        let err = CoreError::trust("/tmp/trust/server.crt", "missing");
        assert!(err.to_string().contains("server.crt"));
        assert!(err.is_fatal());
    }
}
