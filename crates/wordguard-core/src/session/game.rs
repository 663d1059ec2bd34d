// ============================================
// File: crates/wordguard-core/src/session/game.rs
// ============================================
//! # Game Collaborator Interface
//!
//! The server dispatcher drives the word game only through this trait;
//! the protocol never looks inside game state.

/// Result of one guess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Game continues; the updated redacted hint.
    Hint(String),
    /// Game over with the final score.
    Finished {
        /// Final score
        score: i64,
    },
    /// Guess refused without touching game state; the reply text.
    Rejected(String),
}

/// A per-connection word game.
pub trait GameEngine: Send {
    /// Starts a new game and returns the first hint.
    fn start(&mut self) -> String;

    /// The secret answer of the current game, lower-case.
    fn answer(&self) -> &str;

    /// Applies one guess.
    fn process(&mut self, guess: &str) -> TurnOutcome;

    /// Whether a game is in progress.
    fn is_active(&self) -> bool;
}
