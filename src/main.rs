//! Site visitor check-in bot
//!
//! A Telegram bot that walks site staff through entering a visitor's name,
//! organization, purpose and selfie, then records the visit in SQLite.

mod commands;
mod config;
mod db;
mod runtime;
mod state_machine;
mod telegram;

use config::BotConfig;
use db::Database;
use runtime::{DatabaseStore, ProductionRuntime, TelegramTransport};
use std::sync::Arc;
use std::time::Duration;
use telegram::TelegramClient;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Inbound messages buffered between the poller and the runtime
const INBOUND_QUEUE: usize = 64;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "visitor_bot=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = BotConfig::from_env()?;

    // Ensure storage directories exist
    if let Some(parent) = config.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::create_dir_all(&config.image_dir)?;

    // Initialize database
    let db = Database::new(&config.db_path);
    tracing::info!(path = %db.path().display(), "Opening database");
    if let Err(e) = db.ensure_schema() {
        // Keep serving; status and recording report the failure per request
        tracing::error!(error = %e, "Failed to initialize database schema");
    }

    let client = Arc::new(TelegramClient::new(
        &config.bot_token,
        &config.api_base,
        Duration::from_secs(config.poll_timeout_secs),
    )?);

    let shutdown = CancellationToken::new();
    let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_QUEUE);

    let poller = tokio::spawn(telegram::run_polling(
        client.clone(),
        config.poll_timeout_secs,
        inbound_tx,
        shutdown.clone(),
    ));

    let ctrl_c_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested");
            ctrl_c_shutdown.cancel();
        }
    });

    let runtime = ProductionRuntime::new(
        DatabaseStore::new(db),
        TelegramTransport::new(client),
        config.image_dir.clone(),
        inbound_rx,
        shutdown.clone(),
    );
    runtime.run().await;

    shutdown.cancel();
    if let Err(e) = poller.await {
        tracing::error!(error = %e, "Polling task failed");
    }

    Ok(())
}
