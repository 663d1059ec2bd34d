// ============================================
// File: crates/wordguard-server/src/error.rs
// ============================================
//! # Server Error Types
//!
//! ## Last Modified
//! v0.1.0 - Initial server errors

use thiserror::Error;

use wordguard_core::error::CoreError;
use wordguard_transport::error::TransportError;

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Server error types.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to load configuration from '{path}': {reason}")]
    ConfigLoad {
        path: String,
        reason: String,
    },

    #[error("Invalid configuration: {field} - {reason}")]
    ConfigInvalid {
        field: String,
        reason: String,
    },

    #[error("Session limit reached: max {limit} sessions")]
    SessionLimitReached {
        limit: usize,
    },

    #[error("Failed to read wordlist '{path}': {reason}")]
    Wordlist {
        path: String,
        reason: String,
    },

    #[error("Server failed to start: {reason}")]
    StartupFailed {
        reason: String,
    },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn config_invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn wordlist(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Wordlist {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn startup_failed(reason: impl Into<String>) -> Self {
        Self::StartupFailed {
            reason: reason.into(),
        }
    }

    /// Whether the configuration file or flags are at fault.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigLoad { .. } | Self::ConfigInvalid { .. })
    }

    /// Whether the connection should be closed.
    #[must_use]
    pub fn closes_connection(&self) -> bool {
        match self {
            Self::Core(e) => e.is_fatal(),
            Self::Transport(_) | Self::Io(_) => true,
            _ => false,
        }
    }

    /// Whether the peer went away rather than misbehaved.
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_disconnect())
    }
}
