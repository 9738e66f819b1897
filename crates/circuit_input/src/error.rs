//! Error types for input configuration

use thiserror::Error;

/// Input configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    /// A command token did not name any command
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// A physical code was empty
    #[error("Empty input code for command {0}")]
    EmptyCode(String),
}

/// Result type for input operations
pub type Result<T> = std::result::Result<T, InputError>;
