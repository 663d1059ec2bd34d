// ============================================
// File: crates/wordguard-core/src/trust/mod.rs
// ============================================
//! # Trust Bootstrap
//!
//! ## Creation Reason
//! Handshake signatures are only meaningful if the client knows the
//! server's signing key in advance. This module owns the certificate
//! format, the server-side trust directory and the client-side checks.
//!
//! ### Submodules
//! - [`certificate`]: signed JSON certificates
//! - [`store`]: server trust directory, load or generate
//! - [`verify`]: client loading, pinning and advisory checks
//!
//! ## ⚠️ Important Note for Next Developer
//! - There is no revocation; the root authority never leaves the server
//!
//! ## Last Modified
//! v0.1.0 - Initial trust bootstrap

pub mod certificate;
pub mod store;
pub mod verify;

pub use certificate::{Certificate, CertificateBody};
pub use store::{load_or_generate, ServerCredentials, TrustOptions, TrustPaths};
pub use verify::{load_server_identity, ServerIdentity, TrustWarning};
