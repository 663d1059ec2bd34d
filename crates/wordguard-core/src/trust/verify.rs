// ============================================
// File: crates/wordguard-core/src/trust/verify.rs
// ============================================
//! # Server Certificate Checks (client side)
//!
//! ## Creation Reason
//! The client ships with the server's leaf certificate. Before
//! connecting it loads that file, runs the advisory checks and keeps
//! the embedded key for verifying handshake signatures.
//!
//! ## Policy
//! | Check | Failure |
//! |-------|---------|
//! | file readable, well-formed | fatal (`TrustBootstrap`) |
//! | embedded key parses | fatal (`UntrustedCertificate`) |
//! | fingerprint pin, when given | fatal (`UntrustedCertificate`) |
//! | target host listed | warning |
//! | inside validity window | warning |

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::crypto::keys::PublicKey;
use crate::error::{CoreError, Result};
use crate::trust::certificate::Certificate;

/// A non-fatal certificate finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustWarning {
    /// The target host is not named in the certificate.
    HostMismatch {
        /// Host the client connects to
        host: String,
        /// Hosts the certificate names
        hosts: Vec<String>,
    },
    /// The certificate's validity has ended.
    Expired {
        /// End of validity
        not_after: DateTime<Utc>,
    },
    /// The certificate is not valid yet.
    NotYetValid {
        /// Start of validity
        not_before: DateTime<Utc>,
    },
}

impl fmt::Display for TrustWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HostMismatch { host, hosts } => {
                write!(f, "certificate is for {hosts:?}, not {host}")
            }
            Self::Expired { not_after } => write!(f, "certificate expired at {not_after}"),
            Self::NotYetValid { not_before } => write!(f, "certificate not valid before {not_before}"),
        }
    }
}

/// The server identity a client trusts for one run.
#[derive(Debug, Clone)]
pub struct ServerIdentity {
    /// The loaded leaf certificate.
    pub certificate: Certificate,
    /// Key that must have signed every pre-session envelope.
    pub verifying_key: PublicKey,
    /// Certificate fingerprint (hex SHA-256).
    pub fingerprint: String,
    /// Advisory findings, already logged.
    pub warnings: Vec<TrustWarning>,
}

/// Loads and checks the pre-distributed server certificate.
///
/// # Errors
/// `TrustBootstrap` if the file is missing or malformed,
/// `UntrustedCertificate` on a bad key or pin mismatch.
pub fn load_server_identity(path: &Path, host: &str, pin: Option<&str>) -> Result<ServerIdentity> {
    let certificate = Certificate::read(path)?;
    check_certificate(certificate, host, pin, Utc::now())
}

/// Runs the checks against an in-memory certificate.
///
/// # Errors
/// `UntrustedCertificate` on a bad key or pin mismatch.
pub fn check_certificate(
    certificate: Certificate,
    host: &str,
    pin: Option<&str>,
    now: DateTime<Utc>,
) -> Result<ServerIdentity> {
    let verifying_key = certificate.public_key()?;
    let fingerprint = certificate.fingerprint()?;

    if let Some(pin) = pin {
        let wanted = normalize_fingerprint(pin);
        if wanted != fingerprint {
            return Err(CoreError::untrusted(format!(
                "fingerprint {fingerprint} does not match pinned {wanted}"
            )));
        }
    }

    let mut warnings = Vec::new();
    if !certificate.covers_host(host) {
        warnings.push(TrustWarning::HostMismatch {
            host: host.to_string(),
            hosts: certificate.body.hosts.clone(),
        });
    }
    if now > certificate.body.not_after {
        warnings.push(TrustWarning::Expired {
            not_after: certificate.body.not_after,
        });
    } else if now < certificate.body.not_before {
        warnings.push(TrustWarning::NotYetValid {
            not_before: certificate.body.not_before,
        });
    }
    for w in &warnings {
        warn!(warning = %w, "Server certificate check");
    }

    Ok(ServerIdentity {
        certificate,
        verifying_key,
        fingerprint,
        warnings,
    })
}

/// Accepts `AB:CD:...` and mixed case.
fn normalize_fingerprint(pin: &str) -> String {
    pin.chars()
        .filter(|c| *c != ':' && !c.is_whitespace())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trust::store::{ServerCredentials, TrustOptions};
    use chrono::Duration;

    fn leaf() -> Certificate {
        ServerCredentials::generate(&TrustOptions::default()).unwrap().leaf
    }

    #[test]
    fn test_clean_certificate() {
        let cert = leaf();
        let identity = check_certificate(cert.clone(), "127.0.0.1", None, Utc::now()).unwrap();
        assert!(identity.warnings.is_empty());
        assert_eq!(identity.verifying_key, cert.public_key().unwrap());
    }

    #[test]
    fn test_host_mismatch_and_expiry_are_warnings() {
        let cert = leaf();
        let later = cert.body.not_after + Duration::days(1);
        let identity = check_certificate(cert, "example.com", None, later).unwrap();
        assert_eq!(identity.warnings.len(), 2);
        assert!(matches!(identity.warnings[0], TrustWarning::HostMismatch { .. }));
        assert!(matches!(identity.warnings[1], TrustWarning::Expired { .. }));
    }

    #[test]
    fn test_pin() {
        let cert = leaf();
        let fp = cert.fingerprint().unwrap();
        let upper_colons = fp
            .to_uppercase()
            .as_bytes()
            .chunks(2)
            .map(|c| std::str::from_utf8(c).unwrap())
            .collect::<Vec<_>>()
            .join(":");
        assert!(check_certificate(cert.clone(), "localhost", Some(&upper_colons), Utc::now()).is_ok());

        let err = check_certificate(cert, "localhost", Some("00ff"), Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::UntrustedCertificate { .. }));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_server_identity(&dir.path().join("server.crt"), "127.0.0.1", None).unwrap_err();
        assert!(matches!(err, CoreError::TrustBootstrap { .. }));
    }
}
