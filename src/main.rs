//! Intake funnel bot
//!
//! A Telegram webhook service that walks clients through a scripted
//! appraisal conversation and relays the operator's price back to them.

mod api;
mod config;
mod funnel;
mod orders;
mod registry;
mod runtime;
mod telegram;

use api::{create_router, AppState};
use config::BotConfig;
use funnel::ChatId;
use orders::CsvOrderLog;
use registry::Registry;
use runtime::ProductionRuntime;
use std::net::SocketAddr;
use std::sync::Arc;
use telegram::TelegramClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "intake_funnel=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = BotConfig::from_env()?;
    if !config.has_owner() {
        tracing::warn!("OWNER_ID is not set; appraisals will go to chat 0 and exports are disabled");
    }

    tokio::fs::create_dir_all(&config.photos_dir).await?;

    let telegram = Arc::new(TelegramClient::new(
        config.token.clone(),
        &config.api_url,
        config.photos_dir.clone(),
    )?);

    match &config.webhook_url {
        Some(url) => {
            if let Err(e) = telegram.set_webhook(url).await {
                tracing::error!(error = %e, "Failed to register webhook");
            }
        }
        None => tracing::warn!("WEBHOOK_URL is not set; the existing webhook is left untouched"),
    }

    let runtime: ProductionRuntime = ProductionRuntime::new(
        ChatId(config.owner_id),
        config.contact_url.clone(),
        Registry::new(),
        Arc::clone(&telegram),
        telegram,
        Arc::new(CsvOrderLog::new(config.orders_file.clone())),
    );

    let app = create_router(AppState::new(Arc::new(runtime)));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(
        %addr,
        orders = %config.orders_file.display(),
        photos = %config.photos_dir.display(),
        "Intake funnel bot listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
