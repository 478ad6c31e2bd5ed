//! Chorus Converge - herd-convergence detection over a bounded chat window.
//!
//! The engine watches the stream of (author, text) pairs and answers one
//! question: are many distinct participants converging on saying the same
//! word or short phrase right now?
//!
//! # Architecture
//!
//! - [`Window`]: bounded FIFO of recent chat entries plus an incrementally
//!   maintained author → word → count index. The index is never rebuilt
//!   from scratch except on explicit clear.
//! - [`ConvergenceTracker`]: consumes chat entries, recomputes the derived
//!   [`ConvergenceState`] after every mutation, and exposes the typed
//!   setters the operator console tunes at runtime.
//!
//! # Scoring
//!
//! The convergence score is the percentage of unique window participants
//! whose messages contain the dominant word. The alert fires when both the
//! score threshold and the minimum author count are reached (inclusive
//! boundaries).

pub mod error;
pub mod tracker;
pub mod window;

pub use error::{ConvergeError, Result};
pub use tracker::{ConvergenceState, ConvergenceTracker};
pub use window::{ChatEntry, Window};
