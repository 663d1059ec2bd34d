// ============================================
// File: crates/wordguard-server/src/handlers/mod.rs
// ============================================
//! # Connection Handlers
//!
//! ## Creation Reason
//! Runs the per-connection read/dispatch loop on top of the transport
//! and the core session dispatcher.
//!
//! ### Submodules
//! - [`connection`]: one task per accepted TCP stream
//!
//! ## Data Flow
//! ```text
//! socket → FrameReader → ServerSession::receive → replies → writer task → socket
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - A fatal error closes one connection, never the listener
//! - Update connection activity on every inbound frame
//!
//! ## Last Modified
//! v0.1.0 - Initial handlers structure

pub mod connection;

pub use connection::ConnectionHandler;
