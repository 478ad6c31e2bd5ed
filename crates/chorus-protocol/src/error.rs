//! Error types for chorus-protocol.

use thiserror::Error;

/// Result type for chorus-protocol operations.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors that can occur while parsing an inbound line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The input line was empty.
    #[error("empty line")]
    Empty,

    /// No command token could be found after the tag/source markers.
    #[error("line has no command token")]
    MissingCommand,
}
