// ============================================
// File: crates/wordguard-client/src/outcome.rs
// ============================================
//! # Game Outcomes
//!
//! ## Creation Reason
//! The player must be able to tell "the server cheated" apart from "the
//! network dropped" and "this is not the server you trust". Every way a
//! run can end maps to one `Outcome` with its own message and exit code.
//!
//! ## Main Functionality
//! - `Outcome`: terminal state of a client run
//! - Mapping from core and transport errors
//!
//! ## ⚠️ Important Note for Next Developer
//! - Only `Completed` exits 0
//! - Signature and certificate failures must stay `Untrusted`, never
//!   `Protocol`
//!
//! ## Last Modified
//! v0.1.0 - Initial outcome mapping

use std::fmt;

use wordguard_core::CoreError;
use wordguard_transport::TransportError;

/// How a client run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Game finished and the commitment was reproduced.
    Completed {
        /// Score text sent by the server
        score: String,
    },
    /// Game finished but the commitment was never reproduced.
    Tampered {
        /// Score text sent by the server
        score: String,
    },
    /// Certificate or signature check failed.
    Untrusted {
        /// What failed
        reason: String,
    },
    /// Socket closed or failed.
    ConnectionLost {
        /// What happened
        reason: String,
    },
    /// AEAD failure or another fatal protocol error.
    Protocol {
        /// What failed
        reason: String,
    },
    /// Input ended before the game did.
    Abandoned,
}

impl Outcome {
    /// Process exit code for this outcome.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Completed { .. } => 0,
            _ => 1,
        }
    }

    /// Returns `true` for a normal finish.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Classifies a fatal core error.
    #[must_use]
    pub fn from_core_error(err: &CoreError) -> Self {
        match err {
            CoreError::SignatureVerification
            | CoreError::UntrustedCertificate { .. }
            | CoreError::TrustBootstrap { .. } => Self::Untrusted {
                reason: err.to_string(),
            },
            _ => Self::Protocol {
                reason: err.to_string(),
            },
        }
    }

    /// Classifies a transport error.
    #[must_use]
    pub fn from_transport_error(err: &TransportError) -> Self {
        match err {
            TransportError::Core(core) => Self::from_core_error(core),
            _ => Self::ConnectionLost {
                reason: err.to_string(),
            },
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed { score } => write!(f, "Game over! You scored: {score}"),
            Self::Tampered { score } => write!(
                f,
                "GAME OVER received but the game commitment was never confirmed: \
                 the server may have changed the answer since the game started (reported score {score})"
            ),
            Self::Untrusted { reason } => write!(f, "Server untrusted: {reason}"),
            Self::ConnectionLost { reason } => write!(f, "Connection lost: {reason}"),
            Self::Protocol { reason } => write!(f, "Protocol failure: {reason}"),
            Self::Abandoned => write!(f, "Input closed before the game finished"),
        }
    }
}
