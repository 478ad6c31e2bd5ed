//! Inbound command tokens the session dispatches on.

/// Keep-alive probe; must be answered with `PONG` or the server drops us.
pub const PING: &str = "PING";

/// A chat message in the joined channel.
pub const PRIVMSG: &str = "PRIVMSG";

/// Channel leave. Server-initiated PART means the session is over.
pub const PART: &str = "PART";

/// Server notice; carries authentication rejections among other things.
pub const NOTICE: &str = "NOTICE";

/// Authentication succeeded; chat traffic is enabled from here on.
pub const RPL_WELCOME: &str = "001";

/// The server did not recognize one of our outbound commands.
pub const ERR_UNKNOWNCOMMAND: &str = "421";

/// Informational replies the session accepts and intentionally ignores:
/// the remaining welcome numerics, channel roster, message-of-the-day
/// lines, and join confirmations.
pub fn is_informational(command: &str) -> bool {
    matches!(
        command,
        "002" | "003" | "004" | "353" | "366" | "372" | "375" | "376" | "JOIN" | "CAP"
    )
}
