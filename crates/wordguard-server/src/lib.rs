// ============================================
// File: crates/wordguard-server/src/lib.rs
// ============================================
//! # Wordguard Server Library
//!
//! ## Creation Reason
//! Server side of the wordguard word-guess game: accepts TCP connections,
//! runs one secure session per connection and plays a hangman round over
//! the established channel.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`config`]: Server configuration management
//! - [`server`]: Accept loop and shutdown
//! - [`services`]: Business logic services
//!   - [`services::session`]: Connection registry
//!   - [`services::game`]: Word pool and hangman rules
//! - [`handlers`]: Per-connection dispatch loop
//! - [`error`]: Server-specific error types
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Wordguard Server                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌─────────────┐     ┌─────────────┐     ┌─────────────────┐    │
//! │  │   Config    │────►│   Server    │────►│   Connection    │    │
//! │  │             │     │ accept loop │     │    Handler      │    │
//! │  └─────────────┘     └──────┬──────┘     └────────┬────────┘    │
//! │                             │                     │             │
//! │                             ▼                     ▼             │
//! │                      ┌─────────────┐     ┌─────────────────┐    │
//! │                      │  Session    │     │ ServerSession + │    │
//! │                      │  Manager    │     │ Hangman         │    │
//! │                      └─────────────┘     └─────────────────┘    │
//! │                                                                 │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                     Transport Layer                             │
//! │        FrameReader (read half)   │   writer task (write half)   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Data Flow
//! ```text
//! Client → TCP → FrameReader → ServerSession → Hangman
//! Client ← TCP ← writer task ← outbound queue ← ServerSession
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Trust material must be loaded before `Server::new`; a failure there
//!   is fatal to the process
//! - Configuration changes require restart (no hot-reload)
//! - Graceful shutdown waits briefly for active connections
//!
//! ## Last Modified
//! v0.1.0 - Initial server library

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod server;
pub mod services;

// Re-export primary types
pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use server::Server;
pub use services::{Hangman, WordPool};
