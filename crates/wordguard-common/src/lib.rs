// ============================================
// File: crates/wordguard-common/src/lib.rs
// ============================================
//! # Wordguard Common - Shared Utilities Library
//!
//! ## Creation Reason
//! Provides foundational types and utilities shared across all wordguard
//! crates so that the protocol and both binaries agree on clock handling
//! and connection identifiers.
//!
//! ## Main Functionality
//! - [`types`]: Connection-scoped identifiers (`SessionId`)
//! - [`time`]: Atomic activity timestamps and minute-truncated wall clock
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │      wordguard-server        wordguard-client       │
//! │              │                      │               │
//! │              └──────────┬───────────┘               │
//! │                         ▼                           │
//! │                wordguard-transport                  │
//! │                         │                           │
//! │                         ▼                           │
//! │                  wordguard-core                     │
//! │                         │                           │
//! │                         ▼                           │
//! │                wordguard-common  ◄── You are here   │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - This crate is the foundation - changes affect everything
//! - Keep dependencies minimal, no async runtime here
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod time;
pub mod types;

// Re-export commonly used items at crate root
pub use time::{ActivityClock, MinuteStamp};
pub use types::SessionId;
