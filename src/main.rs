mod channel;
mod config;
mod http;
mod pipeline;
mod poller;

use crate::channel::ChannelClient;
use crate::config::Config;
use crate::pipeline::Snapshot;
use crate::poller::TelemetryPoller;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

fn init_tracing() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,firewatch=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing()?;

    let client = ChannelClient::new(&config)?;
    let (snapshot_tx, snapshot_rx) =
        watch::channel(Arc::new(Snapshot::initial(config.smoke_display_max)));

    let cancel = CancellationToken::new();
    TelemetryPoller::new(client, &config, snapshot_tx).start(cancel.clone());
    tracing::info!(
        channel_id = config.channel_id,
        interval_ms = config.poll_interval_ms,
        "telemetry poller started"
    );

    let app = http::router(http::HttpState::new(&config, snapshot_rx));
    let listener = tokio::net::TcpListener::bind(&config.http_bind)
        .await
        .with_context(|| format!("failed to bind {}", config.http_bind))?;
    tracing::info!(bind = %config.http_bind, "firewatch HTTP listening");
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
        _ = server => {}
    }
    cancel.cancel();
    Ok(())
}
