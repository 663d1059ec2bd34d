// ============================================
// File: crates/wordguard-transport/src/error.rs
// ============================================
//! # Transport Error Types
//!
//! ## Creation Reason
//! Socket-level failures for the TCP transport. A transport error ends
//! the connection it happened on and never the process.
//!
//! ## Error Categories
//! 1. **Network Errors**: bind, connect, read and write failures
//! 2. **Framing Errors**: a broken length prefix, wrapped from core
//! 3. **Configuration Errors**: unparseable addresses
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

use wordguard_core::error::CoreError;

// ============================================
// Result Type Alias
// ============================================

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

// ============================================
// TransportError
// ============================================

/// Transport layer error types.
#[derive(Error, Debug)]
pub enum TransportError {
    // ========================================
    // Network Errors
    // ========================================

    /// Failed to bind to address.
    #[error("Failed to bind to {addr}: {reason}")]
    BindFailed {
        /// Address we tried to bind to
        addr: SocketAddr,
        /// Why binding failed
        reason: String,
    },

    /// Address already in use.
    #[error("Address {addr} already in use")]
    AddressInUse {
        /// The address that's in use
        addr: SocketAddr,
    },

    /// Outbound connection failed.
    #[error("Failed to connect to {addr}: {reason}")]
    ConnectFailed {
        /// Peer address
        addr: SocketAddr,
        /// Why connecting failed
        reason: String,
    },

    /// Read from the stream failed.
    #[error("Failed to receive: {reason}")]
    ReceiveFailed {
        /// Why receive failed
        reason: String,
    },

    /// Write to the stream failed.
    #[error("Failed to send: {reason}")]
    SendFailed {
        /// Why send failed
        reason: String,
    },

    /// Peer closed the stream in the middle of a frame.
    #[error("Connection closed with {buffered} bytes of an unfinished frame")]
    ConnectionClosed {
        /// Bytes left in the decoder
        buffered: usize,
    },

    // ========================================
    // Configuration Errors
    // ========================================

    /// Invalid socket address.
    #[error("Invalid address: {addr}")]
    InvalidAddress {
        /// The invalid address string
        addr: String,
    },

    // ========================================
    // Wrapped Errors
    // ========================================

    /// I/O error from the system.
    #[error("I/O error: {context}")]
    Io {
        /// What was happening when the error occurred
        context: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Framing error from core.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl TransportError {
    // ========================================
    // Convenience Constructors
    // ========================================

    /// Creates a `BindFailed` error, or `AddressInUse` when that is the cause.
    pub fn bind_failed(addr: SocketAddr, err: &io::Error) -> Self {
        if err.kind() == io::ErrorKind::AddrInUse {
            Self::AddressInUse { addr }
        } else {
            Self::BindFailed {
                addr,
                reason: err.to_string(),
            }
        }
    }

    /// Creates a `ConnectFailed` error.
    pub fn connect_failed(addr: SocketAddr, reason: impl Into<String>) -> Self {
        Self::ConnectFailed {
            addr,
            reason: reason.into(),
        }
    }

    /// Creates an `Io` error with context.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    // ========================================
    // Error Classification
    // ========================================

    /// Returns `true` if the peer went away.
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        match self {
            Self::ConnectionClosed { .. } => true,
            Self::ReceiveFailed { .. } | Self::SendFailed { .. } => true,
            Self::Io { source, .. } => matches!(
                source.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof
            ),
            _ => false,
        }
    }
}

// ============================================
// Error Conversions
// ============================================

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        Self::Io {
            context: "socket".into(),
            source: err,
        }
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
        let err = TransportError::connect_failed("127.0.0.1:4444".parse().unwrap(), "refused");
        assert!(err.to_string().contains("127.0.0.1:4444"));
        assert!(err.to_string().contains("refused"));
    }

    #[test]
    fn test_bind_failed_in_use() {
        let addr: SocketAddr = "127.0.0.1:4444".parse().unwrap();
        let in_use = io::Error::new(io::ErrorKind::AddrInUse, "busy");
        assert!(matches!(
            TransportError::bind_failed(addr, &in_use),
            TransportError::AddressInUse { .. }
        ));
        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(
            TransportError::bind_failed(addr, &denied),
            TransportError::BindFailed { .. }
        ));
    }

    #[test]
    fn test_classification() {
        let reset: TransportError = io::Error::new(io::ErrorKind::ConnectionReset, "reset").into();
        assert!(reset.is_disconnect());

        let blocked: TransportError = io::Error::new(io::ErrorKind::WouldBlock, "again").into();
        assert!(!blocked.is_disconnect());
        assert!(TransportError::ConnectionClosed { buffered: 3 }.is_disconnect());
    }
}
