// ============================================
// File: crates/wordguard-server/src/config.rs
// ============================================
//! # Server Configuration
//!
//! ## Creation Reason
//! Provides configuration management for the wordguard server from a
//! TOML file, with every section optional and CLI flags layered on top.
//!
//! ## Main Functionality
//! - `ServerConfig`: Main configuration structure
//! - TOML file loading and parsing
//! - Configuration validation
//! - Conversion into trust bootstrap options
//!
//! ## Configuration Sections
//! - `network`: TCP listen address
//! - `game`: optional wordlist file
//! - `trust`: trust directory, certificate hosts and validity
//! - `limits`: connection limit and idle timeout
//! - `logging`: Log level
//!
//! ## Example Configuration
//! ```toml
//! [network]
//! listen_addr = "0.0.0.0:4444"
//!
//! [game]
//! wordlist = "words.txt"
//!
//! [trust]
//! dir = "trust"
//! hosts = ["127.0.0.1", "localhost", "::1"]
//! validity_days = 3650
//!
//! [limits]
//! max_connections = 1000
//! idle_timeout_secs = 0
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - All config changes require server restart
//! - Validate config before server startup
//!
//! ## Last Modified
//! v0.1.0 - Initial configuration implementation

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use wordguard_core::trust::store::{DEFAULT_HOSTS, DEFAULT_VALIDITY_DAYS};
use wordguard_core::trust::{TrustOptions, TrustPaths};

use crate::error::{Result, ServerError};

/// Default TCP port.
pub const DEFAULT_PORT: u16 = 4444;

// ============================================
// ServerConfig
// ============================================

/// Main server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Network configuration.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Game configuration.
    #[serde(default)]
    pub game: GameConfig,

    /// Trust material configuration.
    #[serde(default)]
    pub trust: TrustConfig,

    /// Resource limits.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ServerConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        info!("Loading configuration from: {}", path_str);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ServerError::config_load(&path_str, e.to_string()))?;

        let config: Self =
            toml::from_str(&content).map_err(|e| ServerError::config_load(&path_str, e.to_string()))?;

        config.validate()?;

        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Loads configuration from a string (useful for testing).
    ///
    /// # Errors
    /// Returns error on parse or validation failure.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| ServerError::config_load("<string>", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// `ConfigInvalid` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        self.trust.validate()?;
        self.limits.validate()?;
        Ok(())
    }

    /// Serializes configuration to TOML string.
    #[must_use]
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Applies the `start` subcommand overrides.
    pub fn apply_overrides(&mut self, port: Option<u16>, wordlist: Option<PathBuf>) {
        if let Some(port) = port {
            self.network.listen_addr.set_port(port);
        }
        if wordlist.is_some() {
            self.game.wordlist = wordlist;
        }
    }

    // ========================================
    // Helper methods
    // ========================================

    /// Returns listen address (from network config).
    #[must_use]
    pub const fn listen_addr(&self) -> SocketAddr {
        self.network.listen_addr
    }

    /// Returns max concurrent connections.
    #[must_use]
    pub const fn max_connections(&self) -> usize {
        self.limits.max_connections
    }

    /// Returns the idle timeout, `None` when disabled.
    #[must_use]
    pub const fn idle_timeout(&self) -> Option<Duration> {
        match self.limits.idle_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Returns the trust directory layout.
    #[must_use]
    pub fn trust_paths(&self) -> TrustPaths {
        TrustPaths::new(&self.trust.dir)
    }

    /// Returns options for generating trust material.
    #[must_use]
    pub fn trust_options(&self) -> TrustOptions {
        TrustOptions {
            hosts: self.trust.hosts.clone(),
            validity_days: self.trust.validity_days,
        }
    }
}

// ============================================
// NetworkConfig
// ============================================

/// Network configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// TCP listen address.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT)
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

// ============================================
// GameConfig
// ============================================

/// Game configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameConfig {
    /// Extra words, one per line, appended to the built-in pool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wordlist: Option<PathBuf>,
}

// ============================================
// TrustConfig
// ============================================

/// Trust material configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustConfig {
    /// Directory holding certificates and keys.
    #[serde(default = "default_trust_dir")]
    pub dir: PathBuf,

    /// Hosts asserted by the leaf certificate.
    #[serde(default = "default_hosts")]
    pub hosts: Vec<String>,

    /// Certificate validity in days.
    #[serde(default = "default_validity_days")]
    pub validity_days: u32,
}

fn default_trust_dir() -> PathBuf {
    PathBuf::from("trust")
}

fn default_hosts() -> Vec<String> {
    DEFAULT_HOSTS.iter().map(ToString::to_string).collect()
}

const fn default_validity_days() -> u32 {
    DEFAULT_VALIDITY_DAYS
}

impl TrustConfig {
    fn validate(&self) -> Result<()> {
        if self.dir.as_os_str().is_empty() {
            return Err(ServerError::config_invalid("trust.dir", "cannot be empty"));
        }
        if self.hosts.is_empty() {
            return Err(ServerError::config_invalid("trust.hosts", "at least one host required"));
        }
        if self.validity_days == 0 {
            return Err(ServerError::config_invalid(
                "trust.validity_days",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            dir: default_trust_dir(),
            hosts: default_hosts(),
            validity_days: default_validity_days(),
        }
    }
}

// ============================================
// LimitsConfig
// ============================================

/// Resource limits configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum concurrent connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Seconds without an inbound frame before a connection is closed.
    /// 0 disables the check.
    #[serde(default)]
    pub idle_timeout_secs: u64,
}

const fn default_max_connections() -> usize {
    1000
}

impl LimitsConfig {
    fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(ServerError::config_invalid(
                "limits.max_connections",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            idle_timeout_secs: 0,
        }
    }
}

// ============================================
// LoggingConfig
// ============================================

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
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
    fn test_default_config() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.listen_addr().port(), 4444);
        assert!(config.idle_timeout().is_none());
        assert_eq!(config.trust_paths().leaf_cert(), PathBuf::from("trust/server.crt"));
    }

    #[test]
    fn test_full_config_format() {
        let toml = r#"
            [network]
            listen_addr = "127.0.0.1:5555"

            [game]
            wordlist = "words.txt"

            [trust]
            dir = "/var/lib/wordguard"
            hosts = ["game.example"]
            validity_days = 30

            [limits]
            max_connections = 8
            idle_timeout_secs = 60

            [logging]
            level = "debug"
        "#;

        let config = ServerConfig::from_str(toml).unwrap();
        assert_eq!(config.listen_addr().port(), 5555);
        assert_eq!(config.game.wordlist, Some(PathBuf::from("words.txt")));
        assert_eq!(config.trust_options().hosts, vec!["game.example".to_string()]);
        assert_eq!(config.trust_options().validity_days, 30);
        assert_eq!(config.max_connections(), 8);
        assert_eq!(config.idle_timeout(), Some(Duration::from_secs(60)));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = ServerConfig::from_str("").unwrap();
        assert_eq!(config.trust.hosts.len(), 3);
        assert_eq!(config.limits.max_connections, 1000);
    }

    #[test]
    fn test_validation_failures() {
        assert!(ServerConfig::from_str("[limits]\nmax_connections = 0").is_err());
        assert!(ServerConfig::from_str("[trust]\nhosts = []").is_err());
        assert!(ServerConfig::from_str("[trust]\nvalidity_days = 0").is_err());
        assert!(ServerConfig::from_str("[network]\nlisten_addr = \"nope\"")
            .unwrap_err()
            .is_config_error());
    }

    #[test]
    fn test_overrides_and_round_trip() {
        let mut config = ServerConfig::default();
        config.apply_overrides(Some(7000), Some(PathBuf::from("extra.txt")));
        assert_eq!(config.listen_addr().port(), 7000);

        let reparsed = ServerConfig::from_str(&config.to_toml()).unwrap();
        assert_eq!(reparsed.listen_addr().port(), 7000);
        assert_eq!(reparsed.game.wordlist, Some(PathBuf::from("extra.txt")));
    }
}
