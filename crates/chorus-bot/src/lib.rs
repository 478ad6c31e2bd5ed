//! Chorus Bot - herd-convergence chat bot.
//!
//! Maintains a single long-lived session to the Twitch chat service,
//! watches the stream of incoming chat lines, and detects when many
//! distinct participants converge on saying the same word or short phrase.
//! On detection it emits an automated echo reply, subject to rate limiting
//! and duplicate suppression.
//!
//! # Architecture
//!
//! - **Session**: socket lifecycle, inbound reader, serialized writes
//! - **Tracker** ([`chorus_converge`]): bounded-window convergence scoring
//! - **Throttle**: duplicate suppression, interval gating, emote filtering
//! - **Responder**: deferred sends with a randomized delay, off the
//!   dispatch path
//! - **Console**: stdin REPL for tuning parameters at runtime
//!
//! Exactly one session is modeled; there is no persistence and no
//! automatic reconnection. An operator drives the lifecycle from the
//! console.

pub mod bot;
pub mod config;
pub mod console;
pub mod error;
pub mod helix;
pub mod responder;
pub mod session;
pub mod throttle;

pub use bot::Chatter;
pub use config::BotConfig;
pub use error::{Error, Result};
pub use session::{Credentials, Session, SessionState};
pub use throttle::{EmoteSets, ReplyThrottle};
