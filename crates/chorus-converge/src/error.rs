//! Error types for chorus-converge.

use thiserror::Error;

/// Result type for chorus-converge operations.
pub type Result<T> = std::result::Result<T, ConvergeError>;

/// Errors that can occur when reconfiguring the tracker.
#[derive(Debug, Error, PartialEq)]
pub enum ConvergeError {
    /// Window capacity must be at least 1.
    #[error("invalid window capacity {given}, must be at least 1")]
    InvalidCapacity { given: usize },

    /// Threshold percent must be positive and finite.
    #[error("invalid threshold {given}, must be a positive percentage")]
    InvalidThreshold { given: f64 },
}
