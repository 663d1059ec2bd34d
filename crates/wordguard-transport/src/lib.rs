// ============================================
// File: crates/wordguard-transport/src/lib.rs
// ============================================
//! # Wordguard Transport - Network I/O Layer
//!
//! ## Creation Reason
//! Moves framed envelopes between a TCP socket and a session dispatcher.
//! Both the server connection handler and the client runner use it.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`traits`]: `FrameSource` abstraction for testability
//! - [`tcp`]: listener, connect, `FrameReader`, writer task
//! - [`error`]: Transport-specific error types
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │     wordguard-server          wordguard-client      │
//! │              └──────────┬───────────┘               │
//! │                         ▼                           │
//! │                wordguard-transport ◄── You are here │
//! │                         │                           │
//! │                 wordguard-core (framing)            │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - This crate knows frames, not messages; decryption happens in core
//!
//! ## Last Modified
//! v0.1.0 - Initial transport layer implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod tcp;
pub mod traits;

pub use error::{Result, TransportError};
pub use tcp::{bind_listener, connect, frame_queue, parse_addr, spawn_writer, FrameReader, FrameSender};
pub use traits::FrameSource;
