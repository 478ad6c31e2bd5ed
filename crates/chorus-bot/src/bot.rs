//! Bot assembly - wires the session, tracker, throttle, and responder
//! together and hands the bundle to the operator console.

use std::sync::Arc;

use chorus_converge::ConvergenceTracker;
use tokio::sync::{mpsc, Mutex};

use crate::config::BotConfig;
use crate::console;
use crate::error::Result;
use crate::responder::{self, ResponderConfig};
use crate::session::{Credentials, Session};
use crate::throttle::{EmoteSets, ReplyThrottle};

/// Depth of the reply-candidate channel. Alerts fire on most messages once
/// chat converges; anything beyond a few queued candidates is noise.
const REPLY_QUEUE_DEPTH: usize = 16;

/// The assembled bot: one session, one tracker, one throttle, one
/// responder worker.
pub struct Chatter {
    session: Arc<Session>,
    tracker: Arc<Mutex<ConvergenceTracker>>,
    throttle: Arc<Mutex<ReplyThrottle>>,
    responder: Arc<Mutex<ResponderConfig>>,
}

impl Chatter {
    /// Build the bot from config plus the pre-fetched emote sets.
    pub fn new(config: &BotConfig, emotes: EmoteSets) -> Result<Self> {
        let mut tracker = ConvergenceTracker::new(config.window_capacity)?;
        tracker.set_threshold(config.threshold_percent)?;
        tracker.set_min_repeat_count(config.min_repeat_count);
        let tracker = Arc::new(Mutex::new(tracker));

        let throttle = Arc::new(Mutex::new(
            ReplyThrottle::new(config.max_identical_replies, config.min_send_interval)
                .with_emote_sets(
                    emotes,
                    config.filter_subscriber_emotes,
                    config.filter_follower_emotes,
                ),
        ));

        let responder_config = Arc::new(Mutex::new(ResponderConfig {
            enabled: config.npc_enabled,
            min_delay: config.min_delay,
            max_delay: config.max_delay,
        }));

        let (reply_tx, reply_rx) = mpsc::channel(REPLY_QUEUE_DEPTH);
        let session = Arc::new(Session::new(
            Credentials {
                oauth_token: config.oauth_token.clone(),
                nickname: config.nickname.clone(),
                channel: config.channel.clone(),
            },
            Arc::clone(&tracker),
            reply_tx,
        ));

        responder::spawn(
            reply_rx,
            Arc::clone(&session),
            Arc::clone(&throttle),
            Arc::clone(&responder_config),
        );

        Ok(Self {
            session,
            tracker,
            throttle,
            responder: responder_config,
        })
    }

    /// Run the operator console until exit.
    pub async fn run(&self) -> Result<()> {
        console::run(self).await
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn tracker(&self) -> &Arc<Mutex<ConvergenceTracker>> {
        &self.tracker
    }

    pub fn throttle(&self) -> &Arc<Mutex<ReplyThrottle>> {
        &self.throttle
    }

    pub fn responder(&self) -> &Arc<Mutex<ResponderConfig>> {
        &self.responder
    }
}
