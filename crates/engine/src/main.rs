//! Hellabot - Main entry point.

use std::sync::Arc;

use poise::serenity_prelude as serenity;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hellabot_engine::api::discord;
use hellabot_engine::infrastructure::config::{load_dotenv_from_repo_root, BotConfig};
use hellabot_engine::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the bot may be run from `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hellabot_engine=debug,hellabot=debug,serenity=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Hellabot");

    let config = BotConfig::from_env()?;
    let token = config.discord_token.clone();
    let app = Arc::new(App::from_config(config).await?);

    let mut client = serenity::ClientBuilder::new(token, discord::intents())
        .framework(discord::framework(app))
        .await?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            return;
        }
        tracing::info!("Shutting down");
        shard_manager.shutdown_all().await;
    });

    client.start().await?;
    Ok(())
}
