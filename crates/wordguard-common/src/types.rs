// ============================================
// File: crates/wordguard-common/src/types.rs
// ============================================
//! # Core Type Definitions
//!
//! ## Creation Reason
//! Connections are tracked by the server's session manager and show up in
//! almost every log line; they need a short, opaque, random identifier.
//!
//! ## Main Functionality
//! - `SessionId`: 8 random bytes, rendered as lower-case hex
//!
//! ## ⚠️ Important Note for Next Developer
//! - `SessionId` is bookkeeping only, it never reaches the wire and is
//!   not a secret

use std::fmt;

use rand::RngCore;

// ============================================
// Constants
// ============================================

/// Size of `SessionId` in bytes
pub const SESSION_ID_SIZE: usize = 8;

// ============================================
// SessionId
// ============================================

/// Unique identifier for a live connection.
///
/// # Example
/// ```
/// use wordguard_common::types::SessionId;
///
/// let id = SessionId::generate();
/// assert_eq!(id.to_string().len(), 16);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId([u8; SESSION_ID_SIZE]);

impl SessionId {
    /// Generates a new random `SessionId`.
    #[must_use]
    pub fn generate() -> Self {
        let mut id = [0u8; SESSION_ID_SIZE];
        rand::thread_rng().fill_bytes(&mut id);
        Self(id)
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", hex::encode(self.0))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

// ============================================
// Tests
// ============================================
