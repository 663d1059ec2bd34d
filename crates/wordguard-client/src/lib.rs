// ============================================
// File: crates/wordguard-client/src/lib.rs
// ============================================
//! # Wordguard Client Library
//!
//! ## Creation Reason
//! Terminal client for the wordguard word-guess game. Verifies the server
//! against a pre-distributed certificate, runs the secure handshake and
//! relays the player's guesses.
//!
//! ## Main Functionality
//! - [`config`]: Target server and trust inputs
//! - [`input`]: Local guess validation
//! - [`runner`]: Connection and game loop
//! - [`outcome`]: How a run ended, with exit codes
//!
//! ## ⚠️ Important Note for Next Developer
//! - The client never trusts a server whose handshake signature does not
//!   verify against the loaded certificate
//! - A game that ends without the commitment being reproduced is reported
//!   as tampered, not completed
//!
//! ## Last Modified
//! v0.1.0 - Initial client library

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod input;
pub mod outcome;
pub mod runner;

pub use config::ClientConfig;
pub use input::{validate_guess, InputError};
pub use outcome::Outcome;
pub use runner::GameClient;

/// Shown once at startup.
pub const WELCOME: &str = "\
Welcome to wordguard! You will be presented with hints to guess a word selected by the server.
You can enter guesses as single letters (a-z or A-Z) or as an entire word.
Your score is 10 * (letters in the secret word) - 2 * (letters guessed) - (words guessed).";
