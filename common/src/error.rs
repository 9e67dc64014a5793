//! Error types for currency code handling.

use thiserror::Error;

/// Errors raised when parsing a currency code from user input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodeError {
    /// The code was empty or only whitespace.
    #[error("Currency code cannot be empty")]
    Empty,

    /// The code contained something other than ASCII letters or digits.
    #[error("Invalid currency code: {0}")]
    InvalidCharacter(String),
}
