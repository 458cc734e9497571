//! Shomer - automatic Shabbat content-visibility scheduler
//!
//! Loads configuration, wires the application context, starts the scheduler,
//! and runs until interrupted.

use anyhow::Context as _;
use shomer_api::{commands, AppContext};
use shomer_infra::YouTubeAdapterConfig;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = shomer_infra::config::load().context("failed to load configuration")?;
    let scheduler_enabled = config.scheduler.enabled;

    let ctx = AppContext::new(config, youtube_config_from_env())
        .await
        .context("failed to initialise application context")?;

    if scheduler_enabled {
        commands::start_scheduler(&ctx).await.context("failed to start scheduler")?;
    } else {
        warn!("scheduler disabled by configuration; no timers will be armed");
    }

    info!("shomer running, press ctrl-c to stop");
    tokio::signal::ctrl_c().await.context("failed to listen for shutdown signal")?;

    info!("shutting down");
    if scheduler_enabled {
        if let Err(err) = commands::stop_scheduler(&ctx).await {
            warn!(error = %err, "scheduler did not stop cleanly");
        }
    }

    Ok(())
}

/// OAuth client credentials come from the environment, not the config file.
fn youtube_config_from_env() -> YouTubeAdapterConfig {
    let client_id = std::env::var("SHOMER_YOUTUBE_CLIENT_ID").unwrap_or_default();
    let client_secret = std::env::var("SHOMER_YOUTUBE_CLIENT_SECRET").unwrap_or_default();
    if client_id.is_empty() {
        warn!("SHOMER_YOUTUBE_CLIENT_ID not set; token refresh will fail");
    }
    YouTubeAdapterConfig::new(client_id, client_secret)
}
