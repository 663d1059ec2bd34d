// ============================================
// File: crates/wordguard-core/src/session/mod.rs
// ============================================
//! # Session Module
//!
//! Per-connection protocol state for both roles.
//!
//! ## Submodules
//! - `state`: handshake states, crypto phases, outbound sealing
//! - `game`: the interface the server uses to drive the word game
//! - `server`: server-side dispatcher
//! - `client`: client-side dispatcher

pub mod client;
pub mod game;
pub mod server;
pub mod state;

pub use client::{ClientAction, ClientSession};
pub use game::{GameEngine, TurnOutcome};
pub use server::ServerSession;
pub use state::{seal_message, CryptoPhase, HandshakeState, Sealing};
