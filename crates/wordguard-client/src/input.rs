// ============================================
// File: crates/wordguard-client/src/input.rs
// ============================================
//! Local checks on what the player types before anything is sent.

use thiserror::Error;

/// Longest line accepted from the terminal, in bytes.
pub const MAX_INPUT_LENGTH: usize = 4095;

/// Why a line was not sent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    /// Nothing but whitespace.
    #[error("Enter a letter or a whole word.")]
    Empty,

    /// Something other than ASCII letters.
    #[error("Input must be an upper or lowercase character in the english alphabet (a-z or A-Z).")]
    NotAlphabetic,

    /// Over [`MAX_INPUT_LENGTH`].
    #[error("Length of input must be less than 4096 bytes.")]
    TooLong {
        /// Length of the refused line
        len: usize,
    },
}

/// Returns the guess to send for one line of input.
///
/// # Errors
/// An [`InputError`] whose message is shown to the player.
pub fn validate_guess(line: &str) -> Result<&str, InputError> {
    let guess = line.trim_end_matches(['\r', '\n']);
    if guess.len() > MAX_INPUT_LENGTH {
        return Err(InputError::TooLong { len: guess.len() });
    }
    if guess.trim().is_empty() {
        return Err(InputError::Empty);
    }
    if !guess.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(InputError::NotAlphabetic);
    }
    Ok(guess)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_letters_and_words() {
        assert_eq!(validate_guess("a"), Ok("a"));
        assert_eq!(validate_guess("Apple\r\n"), Ok("Apple"));
    }

    #[test]
    fn test_rejects_non_letters() {
        assert_eq!(validate_guess("a1"), Err(InputError::NotAlphabetic));
        assert_eq!(validate_guess("two words"), Err(InputError::NotAlphabetic));
        assert_eq!(validate_guess("é"), Err(InputError::NotAlphabetic));
        assert_eq!(validate_guess("  "), Err(InputError::Empty));
    }

    #[test]
    fn test_length_limit() {
        let at_limit = "a".repeat(MAX_INPUT_LENGTH);
        assert!(validate_guess(&at_limit).is_ok());

        let over = "a".repeat(MAX_INPUT_LENGTH + 1);
        assert_eq!(
            validate_guess(&over),
            Err(InputError::TooLong { len: MAX_INPUT_LENGTH + 1 })
        );
    }
}
