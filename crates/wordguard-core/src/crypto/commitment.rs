// ============================================
// File: crates/wordguard-core/src/crypto/commitment.rs
// ============================================
//! # Game Commitment
//!
//! ## Creation Reason
//! Lets a client detect a server that swaps the secret answer mid-game.
//! The server publishes a hash binding the answer to this connection at
//! game start; the client recomputes it from its own view and confirms
//! the match before trusting a final score.
//!
//! ## Pre-image
//! ```text
//! "{minute}/{answer}/{client_addr}/{server_addr}"
//!   minute  = UTC start time truncated to the minute, RFC 3339 ("...:00Z")
//!   answer  = lower-case secret word
//!   *_addr  = ip:port as seen by each side
//! commitment = SHA-256(pre-image)
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Both peers must produce byte-identical pre-images; any formatting
//!   change here is a wire change
//! - Equality is constant-time

use std::fmt;
use std::net::SocketAddr;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use wordguard_common::time::MinuteStamp;

use super::SHA256_SIZE;
use crate::error::{CoreError, Result};

/// SHA-256 commitment over a game's session parameters.
#[derive(Clone, Copy)]
pub struct Commitment([u8; SHA256_SIZE]);

impl Commitment {
    /// Builds the pre-image string.
    #[must_use]
    pub fn preimage(
        started: &MinuteStamp,
        answer: &str,
        client_addr: &SocketAddr,
        server_addr: &SocketAddr,
    ) -> String {
        format!("{started}/{answer}/{client_addr}/{server_addr}")
    }

    /// Computes the commitment for a game.
    #[must_use]
    pub fn compute(
        started: &MinuteStamp,
        answer: &str,
        client_addr: &SocketAddr,
        server_addr: &SocketAddr,
    ) -> Self {
        let preimage = Self::preimage(started, answer, client_addr, server_addr);
        Self(Sha256::digest(preimage.as_bytes()).into())
    }

    /// Parses a received commitment.
    ///
    /// # Errors
    /// `MalformedEnvelope` unless exactly 32 bytes are given.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let digest: [u8; SHA256_SIZE] = bytes.try_into().map_err(|_| {
            CoreError::malformed(format!(
                "commitment must be {SHA256_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(digest))
    }

    /// Returns the digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; SHA256_SIZE] {
        &self.0
    }

    /// Compares against raw bytes in constant time.
    #[must_use]
    pub fn matches(&self, other: &[u8]) -> bool {
        other.len() == SHA256_SIZE && bool::from(self.0[..].ct_eq(other))
    }
}

impl PartialEq for Commitment {
    fn eq(&self, other: &Self) -> bool {
        self.0[..].ct_eq(&other.0[..]).into()
    }
}

impl Eq for Commitment {}

impl fmt::Debug for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Commitment({}...)", hex::encode(&self.0[..6]))
    }
}

impl AsRef<[u8]> for Commitment {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn stamp(s: &str) -> MinuteStamp {
        MinuteStamp::truncate(DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc))
    }

    fn addrs() -> (SocketAddr, SocketAddr) {
        ("127.0.0.1:50312".parse().unwrap(), "127.0.0.1:4444".parse().unwrap())
    }

    #[test]
    fn test_preimage_format() {
        let (client, server) = addrs();
        let text = Commitment::preimage(&stamp("2020-05-23T04:24:31Z"), "apple", &client, &server);
        assert_eq!(text, "2020-05-23T04:24:00Z/apple/127.0.0.1:50312/127.0.0.1:4444");

        let v6: SocketAddr = "[::1]:4444".parse().unwrap();
        let text = Commitment::preimage(&stamp("2020-05-23T04:24:31Z"), "apple", &client, &v6);
        assert!(text.ends_with("/[::1]:4444"));
    }

    #[test]
    fn test_deterministic() {
        let (client, server) = addrs();
        let t = stamp("2020-05-23T04:24:31Z");
        let a = Commitment::compute(&t, "apple", &client, &server);
        let b = Commitment::compute(&stamp("2020-05-23T04:24:59Z"), "apple", &client, &server);
        assert_eq!(a, b);

        let expected: [u8; 32] = Sha256::digest(
            b"2020-05-23T04:24:00Z/apple/127.0.0.1:50312/127.0.0.1:4444",
        )
        .into();
        assert_eq!(a.as_bytes(), &expected);
    }

    #[test]
    fn test_each_component_changes_hash() {
        let (client, server) = addrs();
        let t = stamp("2020-05-23T04:24:31Z");
        let base = Commitment::compute(&t, "apple", &client, &server);

        let other_port: SocketAddr = "127.0.0.1:50313".parse().unwrap();
        let variants = [
            Commitment::compute(&stamp("2020-05-23T04:25:00Z"), "apple", &client, &server),
            Commitment::compute(&t, "hello", &client, &server),
            Commitment::compute(&t, "apple", &other_port, &server),
            Commitment::compute(&t, "apple", &client, &other_port),
        ];
        for v in variants {
            assert_ne!(base, v);
        }
    }

    #[test]
    fn test_from_slice_and_matches() {
        let (client, server) = addrs();
        let c = Commitment::compute(&stamp("2020-05-23T04:24:00Z"), "willow", &client, &server);
        let parsed = Commitment::from_slice(c.as_bytes()).unwrap();
        assert_eq!(parsed, c);
        assert!(c.matches(c.as_ref()));
        assert!(!c.matches(&c.as_bytes()[..31]));
        assert!(Commitment::from_slice(&[0u8; 16]).is_err());
    }
}
