// ============================================
// File: crates/wordguard-server/src/services/mod.rs
// ============================================
//! # Server Services
//!
//! ## Creation Reason
//! Business logic that is not protocol: the word game and the
//! process-wide connection registry.
//!
//! ### Submodules
//! - [`game`]: hangman rules and the shared word pool
//! - [`session`]: connection registry and limits
//!
//! ## Last Modified
//! v0.1.0 - Initial services structure

pub mod game;
pub mod session;

// Re-export primary types
pub use game::{Hangman, WordPool};
pub use session::{ConnectionInfo, ConnectionState, SessionManager};
