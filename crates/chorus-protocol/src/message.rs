//! Inbound line parsing.
//!
//! One logical line maps to one [`IrcMessage`]. The grammar handled here is
//! the subset the chat service actually emits:
//!
//! ```text
//! [@tags ] [:nick[!host] ] COMMAND [target ...] [:trailing parameters]
//! ```
//!
//! Tag payloads are skipped, not exposed. Trailing parameters are taken
//! verbatim, embedded spaces included.

use crate::error::{ParseError, Result};

/// The `nick[!host]` pair of a line's source prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Sender nickname.
    pub nick: String,
    /// Host portion after `!`, when present.
    pub host: Option<String>,
}

impl Source {
    fn from_segment(segment: &str) -> Self {
        match segment.split_once('!') {
            Some((nick, host)) => Self {
                nick: nick.to_string(),
                host: Some(host.to_string()),
            },
            None => Self {
                nick: segment.to_string(),
                host: None,
            },
        }
    }
}

/// A structured inbound protocol line.
///
/// `command` is always non-empty when parsing succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrcMessage {
    /// Parsed source prefix, if the line carried one.
    pub source: Option<Source>,
    /// The command token (`PRIVMSG`, `PING`, a three-digit numeric, ...).
    pub command: String,
    /// Everything after the trailing-parameter marker, verbatim.
    pub params: Option<String>,
}

impl IrcMessage {
    /// Nickname of the sender, when the line carried a source prefix.
    pub fn author(&self) -> Option<&str> {
        self.source.as_ref().map(|s| s.nick.as_str())
    }
}

/// Parse one raw line (without terminator) into an [`IrcMessage`].
///
/// A line consisting solely of a tag or source marker is a
/// [`ParseError::MissingCommand`], never a panic - the dispatch loop drops
/// such lines and keeps running.
pub fn parse(line: &str) -> Result<IrcMessage> {
    if line.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut rest = line;

    // Tag section: skip to the first space, payload discarded.
    if rest.starts_with('@') {
        let space = rest.find(' ').ok_or(ParseError::MissingCommand)?;
        rest = &rest[space + 1..];
    }

    // Source prefix: nick[!host] up to the next space.
    let mut source = None;
    if rest.starts_with(':') {
        let space = rest.find(' ').ok_or(ParseError::MissingCommand)?;
        source = Some(Source::from_segment(&rest[1..space]));
        rest = &rest[space + 1..];
    }

    // The first ':' from here on bounds the command-and-target region;
    // everything after it is the trailing parameters, verbatim.
    let (region, params) = match rest.find(':') {
        Some(marker) => (&rest[..marker], Some(rest[marker + 1..].to_string())),
        None => (rest, None),
    };

    let command = region
        .split_whitespace()
        .next()
        .ok_or(ParseError::MissingCommand)?
        .to_string();

    Ok(IrcMessage {
        source,
        command,
        params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_command_with_trailing() {
        let msg = parse("PING :tmi.twitch.tv").unwrap();
        assert_eq!(msg.source, None);
        assert_eq!(msg.command, "PING");
        assert_eq!(msg.params.as_deref(), Some("tmi.twitch.tv"));
    }

    #[test]
    fn chat_line_with_source() {
        let msg =
            parse(":ronnie!ronnie@ronnie.tmi.twitch.tv PRIVMSG #somechannel :KEKW KEKW").unwrap();
        let source = msg.source.unwrap();
        assert_eq!(source.nick, "ronnie");
        assert_eq!(source.host.as_deref(), Some("ronnie@ronnie.tmi.twitch.tv"));
        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.params.as_deref(), Some("KEKW KEKW"));
    }

    #[test]
    fn source_without_host() {
        let msg = parse(":tmi.twitch.tv 001 somebot :Welcome, GLHF!").unwrap();
        let source = msg.source.unwrap();
        assert_eq!(source.nick, "tmi.twitch.tv");
        assert_eq!(source.host, None);
        assert_eq!(msg.command, "001");
        assert_eq!(msg.params.as_deref(), Some("Welcome, GLHF!"));
    }

    #[test]
    fn tag_section_is_skipped() {
        let msg = parse("@badge-info=;color=#FF0000 :u!u@h PRIVMSG #c :hi").unwrap();
        assert_eq!(msg.author(), Some("u"));
        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.params.as_deref(), Some("hi"));
    }

    #[test]
    fn no_trailing_marker_means_no_params() {
        let msg = parse(":u!u@h JOIN #somechannel").unwrap();
        assert_eq!(msg.command, "JOIN");
        assert_eq!(msg.params, None);
    }

    #[test]
    fn params_keep_embedded_spaces() {
        let msg = parse("PRIVMSG #c :one two  three").unwrap();
        assert_eq!(msg.params.as_deref(), Some("one two  three"));
    }

    #[test]
    fn empty_line_is_rejected() {
        assert_eq!(parse(""), Err(ParseError::Empty));
    }

    #[test]
    fn marker_only_lines_are_failures_not_panics() {
        assert_eq!(parse("@tags-only"), Err(ParseError::MissingCommand));
        assert_eq!(parse(":source-only"), Err(ParseError::MissingCommand));
        assert_eq!(parse("   "), Err(ParseError::MissingCommand));
        assert_eq!(parse("@t :s "), Err(ParseError::MissingCommand));
    }
}
