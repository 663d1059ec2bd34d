// ============================================
// File: crates/wordguard-core/src/trust/store.rs
// ============================================
//! # Trust Store
//!
//! ## Creation Reason
//! The server needs a root authority, a leaf certificate signed by it,
//! and an RSA encryption key before it can accept a handshake. This
//! module loads them from a directory or creates whatever is missing.
//!
//! ## Directory Layout
//! | File | Content |
//! |------|---------|
//! | `ca.crt` | self-signed authority certificate |
//! | `ca-key.pem` | authority private key (PKCS#8) |
//! | `server.crt` | leaf certificate, distributed to clients |
//! | `server-key.pem` | leaf signing key (PKCS#8) |
//! | `encryption-key.pem` | key whose public half goes in `PubKeyResponse` |
//!
//! ## Main Logical Flow
//! 1. Load or generate the authority
//! 2. Load the leaf; regenerate it if the authority is new or the leaf no
//!    longer verifies under it
//! 3. Load or generate the encryption key
//!
//! ## ⚠️ Important Note for Next Developer
//! - Private keys are written with mode 0600 on Unix
//! - A corrupt file is an error, never silently replaced; use
//!   `generate` (the `init-trust --force` path) to start over

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::crypto::keys::RsaKeyPair;
use crate::error::{CoreError, Result};
use crate::trust::certificate::Certificate;

// ============================================
// Constants
// ============================================

/// Subject of the generated authority.
pub const AUTHORITY_SUBJECT: &str = "wordguard root authority";

/// Subject of the generated leaf.
pub const LEAF_SUBJECT: &str = "wordguard server";

/// Default leaf hosts: the loopback deployment.
pub const DEFAULT_HOSTS: &[&str] = &["127.0.0.1", "localhost", "::1"];

/// Default certificate lifetime, ten years.
pub const DEFAULT_VALIDITY_DAYS: u32 = 3650;

// ============================================
// TrustPaths
// ============================================

/// File locations inside a trust directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustPaths {
    dir: PathBuf,
}

impl TrustPaths {
    /// Wraps a directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory itself.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Authority certificate.
    #[must_use]
    pub fn ca_cert(&self) -> PathBuf {
        self.dir.join("ca.crt")
    }

    /// Authority key.
    #[must_use]
    pub fn ca_key(&self) -> PathBuf {
        self.dir.join("ca-key.pem")
    }

    /// Leaf certificate.
    #[must_use]
    pub fn leaf_cert(&self) -> PathBuf {
        self.dir.join("server.crt")
    }

    /// Leaf signing key.
    #[must_use]
    pub fn leaf_key(&self) -> PathBuf {
        self.dir.join("server-key.pem")
    }

    /// Handshake encryption key.
    #[must_use]
    pub fn encryption_key(&self) -> PathBuf {
        self.dir.join("encryption-key.pem")
    }
}

// ============================================
// TrustOptions
// ============================================

/// Parameters for newly generated certificates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustOptions {
    /// Hosts written into the leaf.
    pub hosts: Vec<String>,
    /// Lifetime of generated certificates.
    pub validity_days: u32,
}

impl Default for TrustOptions {
    fn default() -> Self {
        Self {
            hosts: DEFAULT_HOSTS.iter().map(|h| (*h).to_string()).collect(),
            validity_days: DEFAULT_VALIDITY_DAYS,
        }
    }
}

// ============================================
// ServerCredentials
// ============================================

/// Everything the server needs to run handshakes.
///
/// Immutable after startup and shared read-only by all connections.
#[derive(Debug, Clone)]
pub struct ServerCredentials {
    /// Root authority certificate.
    pub authority: Certificate,
    /// Leaf certificate handed to clients.
    pub leaf: Certificate,
    /// Key matching `leaf`; signs handshake envelopes.
    pub signing_key: RsaKeyPair,
    /// Key advertised in `PubKeyResponse`; decrypts `SymKeyRequest`.
    pub encryption_key: RsaKeyPair,
}

impl ServerCredentials {
    /// Builds credentials in memory without touching disk.
    ///
    /// # Errors
    /// Key generation or signing failures.
    pub fn generate(options: &TrustOptions) -> Result<Self> {
        let authority_key = RsaKeyPair::generate()?;
        let authority = Certificate::self_signed_authority(&authority_key, AUTHORITY_SUBJECT, options.validity_days)?;
        let signing_key = RsaKeyPair::generate()?;
        let leaf = Certificate::issue_leaf(
            signing_key.public_key(),
            LEAF_SUBJECT,
            options.hosts.clone(),
            options.validity_days,
            &authority,
            &authority_key,
        )?;
        Ok(Self {
            authority,
            leaf,
            signing_key,
            encryption_key: RsaKeyPair::generate()?,
        })
    }
}

// ============================================
// Bootstrap
// ============================================

/// Loads the trust directory, generating whatever is missing.
///
/// # Errors
/// `TrustBootstrap` if a file exists but cannot be read or parsed, or a
/// new file cannot be written.
pub fn load_or_generate(paths: &TrustPaths, options: &TrustOptions) -> Result<ServerCredentials> {
    ensure_dir(paths.dir())?;

    let (authority, authority_key, authority_fresh) = if paths.ca_cert().exists() && paths.ca_key().exists() {
        debug!(path = %paths.ca_cert().display(), "Loading root authority");
        (Certificate::read(&paths.ca_cert())?, read_key(&paths.ca_key())?, false)
    } else {
        info!(dir = %paths.dir().display(), "Generating root authority");
        let key = RsaKeyPair::generate()?;
        let cert = Certificate::self_signed_authority(&key, AUTHORITY_SUBJECT, options.validity_days)?;
        write_key(&paths.ca_key(), &key)?;
        write_certificate(&paths.ca_cert(), &cert)?;
        (cert, key, true)
    };

    let existing_leaf = if !authority_fresh && paths.leaf_cert().exists() && paths.leaf_key().exists() {
        let cert = Certificate::read(&paths.leaf_cert())?;
        let key = read_key(&paths.leaf_key())?;
        let key_matches = cert.public_key().is_ok_and(|k| &k == key.public_key());
        match cert.verify_issued_by(&authority) {
            Ok(()) if key_matches => Some((cert, key)),
            Ok(()) => {
                warn!("Leaf certificate does not match its key, regenerating");
                None
            }
            Err(e) => {
                warn!(error = %e, "Leaf certificate not issued by current authority, regenerating");
                None
            }
        }
    } else {
        None
    };

    let (leaf, signing_key) = match existing_leaf {
        Some(pair) => pair,
        None => {
            info!(hosts = ?options.hosts, "Issuing leaf certificate");
            let key = RsaKeyPair::generate()?;
            let cert = Certificate::issue_leaf(
                key.public_key(),
                LEAF_SUBJECT,
                options.hosts.clone(),
                options.validity_days,
                &authority,
                &authority_key,
            )?;
            write_key(&paths.leaf_key(), &key)?;
            write_certificate(&paths.leaf_cert(), &cert)?;
            (cert, key)
        }
    };

    let encryption_key = if paths.encryption_key().exists() {
        read_key(&paths.encryption_key())?
    } else {
        info!("Generating handshake encryption key");
        let key = RsaKeyPair::generate()?;
        write_key(&paths.encryption_key(), &key)?;
        key
    };

    Ok(ServerCredentials {
        authority,
        leaf,
        signing_key,
        encryption_key,
    })
}

/// Generates fresh trust material, replacing any existing files.
///
/// # Errors
/// `TrustBootstrap` if a file cannot be written.
pub fn generate(paths: &TrustPaths, options: &TrustOptions) -> Result<ServerCredentials> {
    ensure_dir(paths.dir())?;
    for path in [paths.ca_cert(), paths.ca_key(), paths.leaf_cert(), paths.leaf_key(), paths.encryption_key()] {
        if path.exists() {
            std::fs::remove_file(&path).map_err(|e| CoreError::trust(&path, e.to_string()))?;
        }
    }
    load_or_generate(paths, options)
}

// ============================================
// File Helpers
// ============================================

fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| CoreError::trust(dir, e.to_string()))
}

/// Reads a PKCS#8 PEM private key.
///
/// # Errors
/// `TrustBootstrap` if unreadable or not an RSA key.
pub fn read_key(path: &Path) -> Result<RsaKeyPair> {
    let pem = std::fs::read_to_string(path).map_err(|e| CoreError::trust(path, e.to_string()))?;
    RsaKeyPair::from_pem(&pem).map_err(|e| CoreError::trust(path, e.to_string()))
}

/// Writes a private key as PKCS#8 PEM, owner-only on Unix.
///
/// # Errors
/// `TrustBootstrap` on I/O failure.
pub fn write_key(path: &Path, key: &RsaKeyPair) -> Result<()> {
    let pem = key.to_pem()?;
    let io_err = |e: std::io::Error| CoreError::trust(path, e.to_string());

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path).map_err(io_err)?;

    // `mode` only applies on creation; a regenerated key reuses the file.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))
            .map_err(io_err)?;
    }

    file.write_all(pem.as_bytes()).map_err(io_err)?;
    Ok(())
}

/// Writes a certificate as pretty JSON.
///
/// # Errors
/// `TrustBootstrap` on I/O failure.
pub fn write_certificate(path: &Path, cert: &Certificate) -> Result<()> {
    std::fs::write(path, cert.to_json()?).map_err(|e| CoreError::trust(path, e.to_string()))
}

// ============================================
// Tests
// ============================================
