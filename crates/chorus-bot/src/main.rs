//! Chorus bot binary.

use chorus_bot::{helix, BotConfig, Chatter, EmoteSets};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chorus_bot=info,chorus=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Chorus bot");

    let config = BotConfig::from_env()?;

    // Channel metadata is a collaborator, not core: a failed lookup means
    // an empty filter, never a dead bot.
    let emotes = match config.helix_client_id.as_deref() {
        Some(client_id) => {
            match helix::fetch_emote_sets(client_id, &config.oauth_token, &config.channel).await {
                Ok(sets) => sets,
                Err(e) => {
                    tracing::warn!("emote lookup failed, filtering disabled: {e}");
                    EmoteSets::default()
                }
            }
        }
        None => EmoteSets::default(),
    };

    let chatter = Chatter::new(&config, emotes)?;
    chatter.run().await?;

    Ok(())
}
