//! One-shot Helix metadata lookup.
//!
//! Resolves the broadcaster id for the target channel and fetches its emote
//! list, partitioned into the subscriber-only and follower-only name sets
//! the reply throttle filters on. Fetched once before the session opens and
//! treated as static afterwards; failures are reported, never fatal.

use serde::Deserialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::throttle::EmoteSets;

const USERS_URL: &str = "https://api.twitch.tv/helix/users";
const EMOTES_URL: &str = "https://api.twitch.tv/helix/chat/emotes";

#[derive(Debug, Deserialize)]
struct UsersResponse {
    data: Vec<HelixUser>,
}

#[derive(Debug, Deserialize)]
struct HelixUser {
    id: String,
}

#[derive(Debug, Deserialize)]
struct EmotesResponse {
    data: Vec<HelixEmote>,
}

#[derive(Debug, Deserialize)]
struct HelixEmote {
    name: String,
    emote_type: String,
}

/// Fetch the disallowed-emote sets for `channel`.
pub async fn fetch_emote_sets(client_id: &str, token: &str, channel: &str) -> Result<EmoteSets> {
    let client = reqwest::Client::new();

    let users: UsersResponse = client
        .get(USERS_URL)
        .query(&[("login", channel)])
        .header("Client-Id", client_id)
        .bearer_auth(token)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    let Some(user) = users.data.into_iter().next() else {
        return Err(Error::Config(format!("channel '{channel}' not found")));
    };

    let emotes: EmotesResponse = client
        .get(EMOTES_URL)
        .query(&[("broadcaster_id", user.id.as_str())])
        .header("Client-Id", client_id)
        .bearer_auth(token)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let mut sets = EmoteSets::default();
    for emote in emotes.data {
        match emote.emote_type.as_str() {
            "subscriptions" => {
                sets.subscriber.insert(emote.name);
            }
            "follower" => {
                sets.follower.insert(emote.name);
            }
            _ => {}
        }
    }
    info!(
        subscriber = sets.subscriber.len(),
        follower = sets.follower.len(),
        "fetched channel emote sets"
    );
    Ok(sets)
}
