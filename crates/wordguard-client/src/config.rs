// ============================================
// File: crates/wordguard-client/src/config.rs
// ============================================
//! # Client Configuration
//!
//! ## Creation Reason
//! Collects what the client needs to reach and trust one server. Values
//! come from command-line flags; there is no client config file.
//!
//! ## Main Functionality
//! - `ClientConfig`: target host/port and trust inputs
//! - Host resolution
//! - Loading the pre-distributed server certificate
//!
//! ## Last Modified
//! v0.1.0 - Initial client configuration

use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::debug;

use wordguard_core::trust::{load_server_identity, ServerIdentity};
use wordguard_transport::{Result as TransportResult, TransportError};

/// Default server host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_PORT: u16 = 4444;

/// Default location of the server certificate.
pub const DEFAULT_CERT: &str = "trust/server.crt";

/// Where to connect and whom to trust.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server host name or IP address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Pre-distributed leaf certificate.
    pub cert: PathBuf,
    /// Expected certificate fingerprint, hex.
    pub pin: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cert: PathBuf::from(DEFAULT_CERT),
            pin: None,
        }
    }
}

impl ClientConfig {
    /// Resolves `host:port` to the first socket address.
    ///
    /// # Errors
    /// `InvalidAddress` if the host does not resolve.
    pub async fn resolve(&self) -> TransportResult<SocketAddr> {
        let target = format!("{}:{}", self.host, self.port);
        let mut addrs = tokio::net::lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(|_| TransportError::InvalidAddress { addr: target.clone() })?;
        let addr = addrs
            .next()
            .ok_or(TransportError::InvalidAddress { addr: target })?;
        debug!(host = %self.host, addr = %addr, "Resolved server address");
        Ok(addr)
    }

    /// Loads and checks the server certificate for this host.
    ///
    /// # Errors
    /// `TrustBootstrap` or `UntrustedCertificate`.
    pub fn load_identity(&self) -> wordguard_core::Result<ServerIdentity> {
        load_server_identity(&self.cert, &self.host, self.pin.as_deref())
    }
}
