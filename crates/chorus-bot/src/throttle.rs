//! Gate deciding whether an automated reply may be sent right now.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use tracing::debug;

/// Disallowed-emote name sets fetched from channel metadata at startup and
/// static for the session's lifetime.
#[derive(Debug, Clone, Default)]
pub struct EmoteSets {
    /// Subscriber-only emote names.
    pub subscriber: HashSet<String>,
    /// Follower-only emote names.
    pub follower: HashSet<String>,
}

/// Stateful reply gate: duplicate suppression, interval gating, and content
/// filtering, evaluated in that order with short-circuiting.
#[derive(Debug)]
pub struct ReplyThrottle {
    max_identical: u32,
    min_interval: Duration,
    filter_subscriber_emotes: bool,
    filter_follower_emotes: bool,
    emotes: EmoteSets,
    last_text: Option<String>,
    identical_count: u32,
    last_sent_at: Option<Instant>,
}

impl ReplyThrottle {
    /// Create a throttle with empty emote sets.
    pub fn new(max_identical: u32, min_interval: Duration) -> Self {
        Self {
            max_identical,
            min_interval,
            filter_subscriber_emotes: true,
            filter_follower_emotes: true,
            emotes: EmoteSets::default(),
            last_text: None,
            identical_count: 0,
            last_sent_at: None,
        }
    }

    /// Attach the disallowed-emote sets and their per-set toggles.
    #[must_use]
    pub fn with_emote_sets(
        mut self,
        emotes: EmoteSets,
        filter_subscriber: bool,
        filter_follower: bool,
    ) -> Self {
        self.emotes = emotes;
        self.filter_subscriber_emotes = filter_subscriber;
        self.filter_follower_emotes = filter_follower;
        self
    }

    /// Decide whether `candidate` may be sent at `now`, recording the send
    /// history on acceptance.
    pub fn may_send(&mut self, candidate: &str, now: Instant) -> bool {
        // Identical-in-a-row cap. A different text resets the counter.
        let repeated = self.last_text.as_deref() == Some(candidate);
        if repeated && self.identical_count >= self.max_identical {
            debug!(candidate, "reply rejected: identical-reply cap reached");
            return false;
        }

        // Minimum interval since the last accepted send.
        if let Some(last) = self.last_sent_at {
            if now.duration_since(last) < self.min_interval {
                debug!(candidate, "reply rejected: send interval not elapsed");
                return false;
            }
        }

        // Leading token against the disallowed-emote sets.
        if let Some(leading) = candidate.split_whitespace().next() {
            if self.is_disallowed(leading) {
                debug!(leading, "reply rejected: filtered emote");
                return false;
            }
        }

        self.identical_count = if repeated { self.identical_count + 1 } else { 1 };
        self.last_text = Some(candidate.to_string());
        self.last_sent_at = Some(now);
        true
    }

    fn is_disallowed(&self, token: &str) -> bool {
        (self.filter_subscriber_emotes && self.emotes.subscriber.contains(token))
            || (self.filter_follower_emotes && self.emotes.follower.contains(token))
    }

    /// Maximum identical replies in a row.
    pub fn max_identical(&self) -> u32 {
        self.max_identical
    }

    pub fn set_max_identical(&mut self, max: u32) {
        self.max_identical = max;
    }

    /// Minimum interval between accepted sends.
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn set_min_interval(&mut self, interval: Duration) {
        self.min_interval = interval;
    }

    pub fn set_filter_subscriber_emotes(&mut self, on: bool) {
        self.filter_subscriber_emotes = on;
    }

    pub fn set_filter_follower_emotes(&mut self, on: bool) {
        self.filter_follower_emotes = on;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn throttle(max_identical: u32, min_interval: Duration) -> ReplyThrottle {
        ReplyThrottle::new(max_identical, min_interval)
    }

    #[test]
    fn identical_reply_is_capped_and_reset_by_different_text() {
        let mut t = throttle(1, Duration::ZERO);
        let now = Instant::now();

        assert!(t.may_send("KEKW", now));
        assert!(!t.may_send("KEKW", now));
        // A different text resets acceptance.
        assert!(t.may_send("LUL", now));
        assert!(t.may_send("KEKW", now));
    }

    #[test]
    fn cap_above_one_allows_that_many_in_a_row() {
        let mut t = throttle(2, Duration::ZERO);
        let now = Instant::now();

        assert!(t.may_send("KEKW", now));
        assert!(t.may_send("KEKW", now));
        assert!(!t.may_send("KEKW", now));
    }

    #[test]
    fn interval_gates_until_elapsed() {
        let mut t = throttle(5, Duration::from_secs(10));
        let start = Instant::now();

        assert!(t.may_send("one", start));
        assert!(!t.may_send("two", start + Duration::from_secs(9)));
        assert!(t.may_send("two", start + Duration::from_secs(10)));
    }

    #[test]
    fn rejected_sends_do_not_refresh_the_interval() {
        let mut t = throttle(5, Duration::from_secs(10));
        let start = Instant::now();

        assert!(t.may_send("one", start));
        assert!(!t.may_send("two", start + Duration::from_secs(5)));
        // Still measured from the accepted send at `start`.
        assert!(t.may_send("two", start + Duration::from_secs(10)));
    }

    #[test]
    fn filtered_leading_emote_is_rejected() {
        let mut emotes = EmoteSets::default();
        emotes.subscriber.insert("SubEmote".to_string());
        emotes.follower.insert("FollowEmote".to_string());
        let mut t = throttle(5, Duration::ZERO).with_emote_sets(emotes, true, false);
        let now = Instant::now();

        assert!(!t.may_send("SubEmote hype", now));
        // Follower filtering is toggled off.
        assert!(t.may_send("FollowEmote hype", now));
        // Only the leading token is checked.
        assert!(t.may_send("hype SubEmote", now));
    }
}
