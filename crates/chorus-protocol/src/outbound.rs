//! Builders for the fixed set of outbound lines.
//!
//! Each builder returns the line without its `\r\n` terminator; the session
//! appends it when writing. Channel arguments are bare names - the `#`
//! prefix is applied here.

/// Credential presentation. First line of the setup pipeline.
pub fn pass(token: &str) -> String {
    format!("PASS oauth:{token}")
}

/// Identity announcement. Second line of the setup pipeline.
pub fn nick(name: &str) -> String {
    format!("NICK {name}")
}

/// Channel join request. Third line of the setup pipeline.
pub fn join(channel: &str) -> String {
    format!("JOIN #{channel}")
}

/// Polite leave notice sent when closing the session.
pub fn part(channel: &str) -> String {
    format!("PART #{channel}")
}

/// A chat message to the joined channel.
pub fn privmsg(channel: &str, text: &str) -> String {
    format!("PRIVMSG #{channel} :{text}")
}

/// Keep-alive acknowledgment, echoing the probe's payload.
pub fn pong(payload: Option<&str>) -> String {
    match payload {
        Some(payload) => format!("PONG {payload}"),
        None => "PONG".to_string(),
    }
}
