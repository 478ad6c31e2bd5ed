//! Deferred automated-reply worker.
//!
//! Reply candidates arrive over a channel from the inbound dispatch path.
//! The throttle check and the randomized pre-send delay both run here, on
//! their own task, so the reader loop never sleeps and keep-alive probes
//! are always answered promptly.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::session::Session;
use crate::throttle::ReplyThrottle;

/// Runtime-tunable responder knobs.
#[derive(Debug, Clone)]
pub struct ResponderConfig {
    /// Global automated-reply toggle.
    pub enabled: bool,
    /// Lower bound of the randomized pre-send delay.
    pub min_delay: Duration,
    /// Upper bound of the randomized pre-send delay.
    pub max_delay: Duration,
}

/// Spawn the responder worker consuming reply candidates.
pub fn spawn(
    mut candidates: mpsc::Receiver<String>,
    session: Arc<Session>,
    throttle: Arc<Mutex<ReplyThrottle>>,
    config: Arc<Mutex<ResponderConfig>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(candidate) = candidates.recv().await {
            let (enabled, min_delay, max_delay) = {
                let config = config.lock().await;
                (config.enabled, config.min_delay, config.max_delay)
            };
            if !enabled {
                trace!("automated replies disabled, candidate dropped");
                continue;
            }
            if !throttle.lock().await.may_send(&candidate, Instant::now()) {
                continue;
            }

            // The delay makes the reply look less mechanical; it runs here,
            // never on the dispatch path that detected the alert.
            let delay = pre_send_delay(min_delay, max_delay);
            debug!(?delay, %candidate, "reply accepted, delaying send");
            tokio::time::sleep(delay).await;

            if let Err(e) = session.send_chat(&candidate).await {
                warn!("automated reply failed: {e}");
            }
        }
    })
}

/// Uniform random delay over `[min, max]`; a degenerate range collapses to
/// `min`.
fn pre_send_delay(min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }
    let secs = rand::thread_rng().gen_range(min.as_secs_f64()..=max.as_secs_f64());
    Duration::from_secs_f64(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_stays_within_bounds() {
        let min = Duration::from_secs(2);
        let max = Duration::from_secs(7);
        for _ in 0..100 {
            let delay = pre_send_delay(min, max);
            assert!(delay >= min && delay <= max);
        }
    }

    #[test]
    fn degenerate_range_collapses_to_min() {
        let d = Duration::from_secs(4);
        assert_eq!(pre_send_delay(d, d), d);
        assert_eq!(pre_send_delay(d, Duration::from_secs(1)), d);
    }
}
