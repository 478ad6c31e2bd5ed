//! Chorus Protocol - IRC dialect spoken by the Twitch chat service.
//!
//! This crate is the stateless wire layer of the Chorus bot:
//!
//! - [`parse`] turns one raw inbound line into a structured [`IrcMessage`]
//!   (source identity, command token, trailing parameters).
//! - [`outbound`] builds the fixed set of lines the bot ever writes
//!   (credential presentation, identity announcement, join/part, chat
//!   messages, keep-alive acknowledgments).
//! - [`command`] names the inbound command tokens the session dispatches on.
//!
//! Lines are handled without their `\r\n` terminator - the session layer
//! owns framing in both directions.

pub mod command;
pub mod error;
pub mod message;
pub mod outbound;

pub use error::{ParseError, Result};
pub use message::{parse, IrcMessage, Source};
