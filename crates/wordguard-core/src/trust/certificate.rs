// ============================================
// File: crates/wordguard-core/src/trust/certificate.rs
// ============================================
//! # Certificates
//!
//! ## Creation Reason
//! The client must know which key signs the server's handshake
//! envelopes. A small signed JSON certificate carries that key, the
//! hosts it is meant for and its validity window.
//!
//! ## Document Shape
//! ```text
//! {
//!   "body": { serial, subject, issuer, hosts, not_before, not_after,
//!             is_ca, public_key (b64 SPKI DER) },
//!   "signature": b64 RSA-PSS-SHA256(issuer key, compact JSON of body)
//! }
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The signature and the fingerprint both use the compact
//!   `serde_json` encoding of the body; field order is the struct order
//! - Times are stored at whole-second precision

use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Duration, SubsecRound, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::crypto::asymmetric::{verify_signature, AsymmetricCrypto, DefaultAsymmetricCrypto};
use crate::crypto::keys::{PublicKey, RsaKeyPair};
use crate::error::{CoreError, Result};

// ============================================
// CertificateBody
// ============================================

/// Signed portion of a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateBody {
    /// Random serial, lower-case hex.
    pub serial: String,
    /// Name of the key holder.
    pub subject: String,
    /// Subject of the signing authority.
    pub issuer: String,
    /// Host names and IP addresses the certificate is meant for.
    pub hosts: Vec<String>,
    /// Start of validity.
    pub not_before: DateTime<Utc>,
    /// End of validity.
    pub not_after: DateTime<Utc>,
    /// Whether the key may sign other certificates.
    pub is_ca: bool,
    /// Base64 SPKI DER of the subject's public key.
    pub public_key: String,
}

impl CertificateBody {
    /// Starts a body valid from now for `validity_days`.
    ///
    /// # Errors
    /// `KeyEncoding` if the public key cannot be serialized.
    pub fn new(
        subject: impl Into<String>,
        issuer: impl Into<String>,
        key: &PublicKey,
        hosts: Vec<String>,
        validity_days: u32,
        is_ca: bool,
    ) -> Result<Self> {
        let mut serial = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut serial);
        let not_before = Utc::now().trunc_subsecs(0);
        Ok(Self {
            serial: hex::encode(serial),
            subject: subject.into(),
            issuer: issuer.into(),
            hosts,
            not_before,
            not_after: not_before + Duration::days(i64::from(validity_days)),
            is_ca,
            public_key: BASE64.encode(key.to_der()?),
        })
    }

    fn canonical(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| CoreError::key_encoding(format!("certificate body: {e}")))
    }
}

// ============================================
// Certificate
// ============================================

/// A certificate body plus its issuer's signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    /// Signed content.
    pub body: CertificateBody,
    /// Issuer's PSS signature over the canonical body.
    #[serde(with = "crate::protocol::messages::base64_bytes")]
    pub signature: Vec<u8>,
}

impl Certificate {
    /// Signs `body` with `issuer_key`.
    ///
    /// # Errors
    /// `SignatureCreation` or `KeyEncoding`.
    pub fn issue(body: CertificateBody, issuer_key: &RsaKeyPair) -> Result<Self> {
        let signature = DefaultAsymmetricCrypto.sign(issuer_key, &body.canonical()?)?;
        Ok(Self { body, signature })
    }

    /// Creates a self-signed authority certificate.
    ///
    /// # Errors
    /// See [`Certificate::issue`].
    pub fn self_signed_authority(key: &RsaKeyPair, subject: &str, validity_days: u32) -> Result<Self> {
        let body = CertificateBody::new(subject, subject, key.public_key(), Vec::new(), validity_days, true)?;
        Self::issue(body, key)
    }

    /// Creates a leaf certificate for `leaf_key`, signed by the authority.
    ///
    /// # Errors
    /// `InvalidState` if `authority` is not a CA, otherwise see
    /// [`Certificate::issue`].
    pub fn issue_leaf(
        leaf_key: &PublicKey,
        subject: &str,
        hosts: Vec<String>,
        validity_days: u32,
        authority: &Self,
        authority_key: &RsaKeyPair,
    ) -> Result<Self> {
        if !authority.body.is_ca {
            return Err(CoreError::invalid_state("issue leaf certificate", "CA issuer"));
        }
        let body = CertificateBody::new(
            subject,
            authority.body.subject.clone(),
            leaf_key,
            hosts,
            validity_days,
            false,
        )?;
        Self::issue(body, authority_key)
    }

    /// Extracts the subject's public key.
    ///
    /// # Errors
    /// `UntrustedCertificate` if the embedded key is not valid.
    pub fn public_key(&self) -> Result<PublicKey> {
        let der = BASE64
            .decode(self.body.public_key.as_bytes())
            .map_err(|e| CoreError::untrusted(format!("public key encoding: {e}")))?;
        PublicKey::from_der(&der).map_err(|e| CoreError::untrusted(e.to_string()))
    }

    /// Checks the signature against an issuer key.
    ///
    /// # Errors
    /// `SignatureVerification` on mismatch.
    pub fn verify_signature(&self, issuer_key: &PublicKey) -> Result<()> {
        verify_signature(issuer_key, &self.body.canonical()?, &self.signature)
    }

    /// Checks that `authority` issued this certificate.
    ///
    /// # Errors
    /// `UntrustedCertificate` or `SignatureVerification`.
    pub fn verify_issued_by(&self, authority: &Self) -> Result<()> {
        if !authority.body.is_ca {
            return Err(CoreError::untrusted("issuer is not a certificate authority"));
        }
        if self.body.issuer != authority.body.subject {
            return Err(CoreError::untrusted(format!(
                "issuer '{}' does not match authority '{}'",
                self.body.issuer, authority.body.subject
            )));
        }
        self.verify_signature(&authority.public_key()?)
    }

    /// Whether `at` lies inside the validity window.
    #[must_use]
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.body.not_before <= at && at <= self.body.not_after
    }

    /// Whether the certificate names `host` (case-insensitive).
    #[must_use]
    pub fn covers_host(&self, host: &str) -> bool {
        self.body.hosts.iter().any(|h| h.eq_ignore_ascii_case(host))
    }

    /// Lower-case hex SHA-256 of the canonical encoding.
    ///
    /// # Errors
    /// `KeyEncoding` on serialization failure.
    pub fn fingerprint(&self) -> Result<String> {
        let canonical = serde_json::to_vec(self)
            .map_err(|e| CoreError::key_encoding(format!("certificate: {e}")))?;
        Ok(hex::encode(Sha256::digest(canonical)))
    }

    /// Serializes as pretty JSON for storage.
    ///
    /// # Errors
    /// `KeyEncoding` on serialization failure.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| CoreError::key_encoding(format!("certificate: {e}")))
    }

    /// Parses a stored certificate.
    ///
    /// # Errors
    /// `UntrustedCertificate` if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CoreError::untrusted(format!("malformed certificate: {e}")))
    }

    /// Reads a certificate file.
    ///
    /// # Errors
    /// `TrustBootstrap` if unreadable or malformed.
    pub fn read(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| CoreError::trust(path, e.to_string()))?;
        Self::from_json(&json).map_err(|e| CoreError::trust(path, e.to_string()))
    }
}

// ============================================
// Tests
// ============================================
