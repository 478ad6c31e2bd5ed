//! Bot configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

/// Configuration for the Chorus bot.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// OAuth token presented during the setup handshake.
    pub oauth_token: String,

    /// Bot account nickname.
    pub nickname: String,

    /// Target channel (bare name, no `#`).
    pub channel: String,

    /// Convergence window capacity.
    pub window_capacity: usize,

    /// Convergence alert threshold percent.
    pub threshold_percent: f64,

    /// Minimum distinct-author count for an alert.
    pub min_repeat_count: usize,

    /// Lower bound of the randomized pre-send delay.
    pub min_delay: Duration,

    /// Upper bound of the randomized pre-send delay.
    pub max_delay: Duration,

    /// Minimum interval between accepted automated replies.
    pub min_send_interval: Duration,

    /// Maximum identical automated replies in a row.
    pub max_identical_replies: u32,

    /// Whether automated replies are enabled at startup.
    pub npc_enabled: bool,

    /// Helix application client id; emote filtering is skipped without it.
    pub helix_client_id: Option<String>,

    /// Drop replies leading with a subscriber-only emote.
    pub filter_subscriber_emotes: bool,

    /// Drop replies leading with a follower-only emote.
    pub filter_follower_emotes: bool,
}

impl BotConfig {
    /// Load config from environment variables.
    ///
    /// Credentials (`CHORUS_OAUTH_TOKEN`, `CHORUS_NICKNAME`, `CHORUS_CHANNEL`)
    /// are required; every tuning knob has a default.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            oauth_token: require("CHORUS_OAUTH_TOKEN")?,
            nickname: require("CHORUS_NICKNAME")?,
            channel: require("CHORUS_CHANNEL")?,
            window_capacity: env_parse("CHORUS_WINDOW_CAPACITY", 5)?,
            threshold_percent: env_parse("CHORUS_THRESHOLD_PERCENT", 75.0)?,
            min_repeat_count: env_parse("CHORUS_MIN_REPEAT_COUNT", 3)?,
            min_delay: Duration::from_secs(env_parse("CHORUS_MIN_DELAY_SECS", 10)?),
            max_delay: Duration::from_secs(env_parse("CHORUS_MAX_DELAY_SECS", 60)?),
            min_send_interval: Duration::from_secs(env_parse("CHORUS_MIN_SEND_INTERVAL_SECS", 10)?),
            max_identical_replies: env_parse("CHORUS_MAX_IDENTICAL_REPLIES", 1)?,
            npc_enabled: env_parse("CHORUS_NPC_ENABLED", true)?,
            helix_client_id: std::env::var("CHORUS_HELIX_CLIENT_ID").ok(),
            filter_subscriber_emotes: env_parse("CHORUS_FILTER_SUBSCRIBER_EMOTES", true)?,
            filter_follower_emotes: env_parse("CHORUS_FILTER_FOLLOWER_EMOTES", true)?,
        })
    }
}

fn require(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| Error::Config(format!("{key} is not set")))
}

fn env_parse<T: FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|_| Error::Config(format!("invalid value for {key}: '{value}'"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment access is process global, so everything lives in one test.
    #[test]
    fn from_env_requires_credentials_and_applies_defaults() {
        for key in [
            "CHORUS_OAUTH_TOKEN",
            "CHORUS_NICKNAME",
            "CHORUS_CHANNEL",
            "CHORUS_WINDOW_CAPACITY",
        ] {
            std::env::remove_var(key);
        }
        assert!(matches!(BotConfig::from_env(), Err(Error::Config(_))));

        std::env::set_var("CHORUS_OAUTH_TOKEN", "token");
        std::env::set_var("CHORUS_NICKNAME", "somebot");
        std::env::set_var("CHORUS_CHANNEL", "somechannel");
        let config = BotConfig::from_env().unwrap();
        assert_eq!(config.window_capacity, 5);
        assert_eq!(config.threshold_percent, 75.0);
        assert_eq!(config.min_repeat_count, 3);
        assert_eq!(config.min_delay, Duration::from_secs(10));
        assert_eq!(config.max_delay, Duration::from_secs(60));
        assert_eq!(config.max_identical_replies, 1);
        assert!(config.npc_enabled);

        std::env::set_var("CHORUS_WINDOW_CAPACITY", "not-a-number");
        assert!(matches!(BotConfig::from_env(), Err(Error::Config(_))));

        std::env::set_var("CHORUS_WINDOW_CAPACITY", "12");
        assert_eq!(BotConfig::from_env().unwrap().window_capacity, 12);
    }
}
