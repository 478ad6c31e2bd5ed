//! Error types for chorus-bot.

use thiserror::Error;

/// Result type for chorus-bot operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in bot operations.
#[derive(Debug, Error)]
pub enum Error {
    /// `open()` was called while the session is not `Disconnected`.
    #[error("connection is already established")]
    AlreadyOpen,

    /// `close()` was called while the session is already `Disconnected`.
    #[error("connection is already closed")]
    AlreadyClosed,

    /// A chat send was attempted outside the `Joined` state.
    #[error("can't send messages because connection isn't established")]
    NotConnected,

    /// Handshake, DNS, or socket failure. Never retried at this layer.
    #[error("transport error: {0}")]
    Transport(String),

    /// Missing or invalid configuration.
    #[error("config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unparseable protocol line.
    #[error("parse error: {0}")]
    Parse(#[from] chorus_protocol::ParseError),

    /// Invalid tracker configuration.
    #[error(transparent)]
    Converge(#[from] chorus_converge::ConvergeError),

    /// Helix metadata lookup failure.
    #[error("metadata lookup failed: {0}")]
    Http(#[from] reqwest::Error),
}
