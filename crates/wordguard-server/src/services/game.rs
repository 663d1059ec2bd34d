// ============================================
// File: crates/wordguard-server/src/services/game.rs
// ============================================
//! # Hangman Game Service
//!
//! ## Creation Reason
//! The word game the protocol carries. Each connection owns one
//! `Hangman`; the shared `WordPool` is read-only after startup.
//!
//! ## Rules
//! - Guesses are lower-cased
//! - One letter: recorded, every matching position revealed; the game
//!   ends when no `_` is left
//! - Several letters: ends the game if equal to the answer, otherwise
//!   counted as a wrong word guess
//! - More than 100 bytes: rejected, nothing recorded
//! - Score = 10 × answer length − 2 × letter guesses − wrong word guesses
//!
//! ## Last Modified
//! v0.1.0 - Initial game implementation

use std::path::Path;
use std::sync::Arc;

use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use wordguard_core::session::{GameEngine, TurnOutcome};

use crate::error::{Result, ServerError};

/// Built-in answers.
pub const DEFAULT_WORDS: &[&str] = &["apple", "hello", "laminate", "sorcerer", "willow"];

/// Longest accepted guess, in bytes.
pub const MAX_GUESS_LENGTH: usize = 100;

/// Reply to an over-long guess.
pub const GUESS_TOO_LONG: &str = "Guesses are limited to 100 characters in length.";

// ============================================
// WordPool
// ============================================

/// Candidate answers shared by every connection.
#[derive(Debug, Clone)]
pub struct WordPool {
    words: Arc<[String]>,
}

impl WordPool {
    /// Builds a pool from explicit words; used by tests and tools.
    ///
    /// # Errors
    /// `ConfigInvalid` if no usable word is given.
    pub fn from_words<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: Vec<String> = words.into_iter().filter_map(|w| normalize_word(w.as_ref())).collect();
        if words.is_empty() {
            return Err(ServerError::config_invalid("game.wordlist", "no usable words"));
        }
        Ok(Self { words: words.into() })
    }

    /// Built-in pool plus, if given, the words from `wordlist`.
    ///
    /// # Errors
    /// `Wordlist` if the file cannot be read.
    pub async fn load(wordlist: Option<&Path>) -> Result<Self> {
        let mut words: Vec<String> = DEFAULT_WORDS.iter().map(ToString::to_string).collect();

        if let Some(path) = wordlist {
            let path_str = path.display().to_string();
            let content = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| ServerError::wordlist(&path_str, e.to_string()))?;
            let before = words.len();
            words.extend(parse_wordlist(&content));
            info!(path = %path_str, added = words.len() - before, "Wordlist loaded");
        }

        Self::from_words(words)
    }

    /// Number of candidate answers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Always false; construction rejects empty pools.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    fn pick(&self) -> &str {
        self.words
            .choose(&mut rand::thread_rng())
            .map_or(DEFAULT_WORDS[0], String::as_str)
    }
}

impl Default for WordPool {
    fn default() -> Self {
        Self {
            words: DEFAULT_WORDS.iter().map(ToString::to_string).collect::<Vec<_>>().into(),
        }
    }
}

fn normalize_word(raw: &str) -> Option<String> {
    let word = raw.trim().to_lowercase();
    (!word.is_empty() && word.chars().all(|c| c.is_ascii_alphabetic())).then_some(word)
}

/// Parses a wordlist file body, skipping blank and non-alphabetic lines.
fn parse_wordlist(content: &str) -> Vec<String> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(i, line)| {
            let word = normalize_word(line);
            if word.is_none() {
                warn!(line = i + 1, "Skipping non-alphabetic wordlist entry");
            }
            word
        })
        .collect()
}

// ============================================
// Hangman
// ============================================

/// One player's game.
#[derive(Debug, Clone)]
pub struct Hangman {
    pool: WordPool,
    answer: String,
    hint: Vec<u8>,
    letter_guesses: usize,
    wrong_words: usize,
    active: bool,
}

impl Hangman {
    /// Creates an idle game drawing answers from `pool`.
    #[must_use]
    pub fn new(pool: WordPool) -> Self {
        Self {
            pool,
            answer: String::new(),
            hint: Vec::new(),
            letter_guesses: 0,
            wrong_words: 0,
            active: false,
        }
    }

    /// The redacted answer.
    #[must_use]
    pub fn hint(&self) -> String {
        String::from_utf8_lossy(&self.hint).into_owned()
    }

    /// Current score formula applied to the guesses so far.
    #[must_use]
    pub fn score(&self) -> i64 {
        let len = i64::try_from(self.answer.len()).unwrap_or(i64::MAX / 10);
        let letters = i64::try_from(self.letter_guesses).unwrap_or(i64::MAX / 4);
        let words = i64::try_from(self.wrong_words).unwrap_or(i64::MAX / 4);
        10 * len - 2 * letters - words
    }

    fn finish(&mut self) -> TurnOutcome {
        self.active = false;
        let score = self.score();
        debug!(score, letters = self.letter_guesses, words = self.wrong_words, "Word solved");
        TurnOutcome::Finished { score }
    }
}

impl GameEngine for Hangman {
    fn start(&mut self) -> String {
        self.answer = self.pool.pick().to_string();
        self.hint = vec![b'_'; self.answer.len()];
        self.letter_guesses = 0;
        self.wrong_words = 0;
        self.active = true;
        self.hint()
    }

    fn answer(&self) -> &str {
        &self.answer
    }

    fn process(&mut self, guess: &str) -> TurnOutcome {
        if guess.len() > MAX_GUESS_LENGTH {
            return TurnOutcome::Rejected(GUESS_TOO_LONG.to_string());
        }
        let guess = guess.to_lowercase();

        if guess.len() == 1 {
            self.letter_guesses += 1;
            let letter = guess.as_bytes()[0];
            for (slot, &c) in self.hint.iter_mut().zip(self.answer.as_bytes()) {
                if c == letter {
                    *slot = letter;
                }
            }
            if !self.hint.contains(&b'_') {
                return self.finish();
            }
        } else if guess == self.answer {
            return self.finish();
        } else {
            self.wrong_words += 1;
        }

        TurnOutcome::Hint(self.hint())
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    fn game(answer: &str) -> Hangman {
        let mut game = Hangman::new(WordPool::from_words([answer]).unwrap());
        game.start();
        game
    }

    #[test]
    fn test_letter_then_word_scores_48() {
        let mut game = game("apple");
        assert_eq!(game.hint(), "_____");

        assert_eq!(game.process("a"), TurnOutcome::Hint("a____".to_string()));
        assert_eq!(game.process("APPLE"), TurnOutcome::Finished { score: 48 });
        assert!(!game.is_active());
    }

    #[test]
    fn test_letters_complete_the_word() {
        let mut game = game("hello");
        for letter in ["h", "e", "l"] {
            assert!(matches!(game.process(letter), TurnOutcome::Hint(_)));
        }
        assert_eq!(game.process("o"), TurnOutcome::Finished { score: 42 });
    }

    #[test]
    fn test_repeat_and_wrong_guesses_count() {
        let mut game = game("willow");
        game.process("w");
        game.process("w");
        assert_eq!(game.process("pillow"), TurnOutcome::Hint("w____w".to_string()));
        assert_eq!(game.process("willow"), TurnOutcome::Finished { score: 60 - 4 - 1 });
    }

    #[test]
    fn test_long_guess_rejected() {
        let mut game = game("apple");
        let long = "a".repeat(101);
        assert_eq!(game.process(&long), TurnOutcome::Rejected(GUESS_TOO_LONG.to_string()));
        assert_eq!(game.score(), 50);
        assert!(game.is_active());
    }

    #[test]
    fn test_restart_resets_state() {
        let mut game = game("apple");
        game.process("z");
        game.process("apple");
        assert_eq!(game.start(), "_____");
        assert_eq!(game.score(), 50);
        assert!(game.is_active());
    }

    #[test]
    fn test_parse_wordlist() {
        let words = parse_wordlist("  Rust \n\nhello world\ncrab42\nferris\n");
        assert_eq!(words, vec!["rust".to_string(), "ferris".to_string()]);
    }

    #[tokio::test]
    async fn test_load_wordlist_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.txt");
        std::fs::write(&path, "banana\n").unwrap();

        let pool = WordPool::load(Some(&path)).await.unwrap();
        assert_eq!(pool.len(), DEFAULT_WORDS.len() + 1);

        let missing = WordPool::load(Some(&dir.path().join("nope.txt"))).await;
        assert!(matches!(missing, Err(ServerError::Wordlist { .. })));
    }

    #[test]
    fn test_empty_pool_rejected() {
        assert!(WordPool::from_words(["", "42"]).is_err());
    }
}
