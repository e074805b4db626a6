//! Stock Watchlist - personal watchlist tracker
//!
//! Tracks a manually ordered list of stocks and keeps their quotes fresh
//! during trading hours, served over a small REST API.

pub mod config;
pub mod db;
pub mod error;
pub mod quotes;
pub mod scheduler;
pub mod server;
pub mod services;
pub mod state;

use anyhow::Context;
use config::AppConfig;
use scheduler::PriceRefreshScheduler;
use server::ApiServer;
use services::{run_blocking, OrderingService};
use state::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Start the refresh scheduler and API server; return after Ctrl-C
pub async fn run() -> anyhow::Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stock_watchlist=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Stock Watchlist...");

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    let state = AppState::new(config).context("Failed to initialize application state")?;

    // Rows that predate manual ordering get a place at the end of the list
    let db = state.sqlite.clone();
    if let Err(e) = run_blocking(move || OrderingService::initialize_order_indices(&db)).await {
        tracing::error!("Failed to initialize order indices: {}", e);
    }

    let scheduler = PriceRefreshScheduler::new(state.clone()).start();

    let mut server = ApiServer::new(state.config.server.clone());
    if let Err(e) = server.start(state.clone()).await {
        scheduler.shutdown().await;
        return Err(e).context("Failed to start API server");
    }

    tracing::info!("Application started, press Ctrl-C to stop");

    let signal = tokio::signal::ctrl_c().await;
    if let Err(e) = &signal {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }

    tracing::info!("Shutting down...");
    server.shutdown().await;
    scheduler.shutdown().await;
    tracing::info!("Stopped");

    signal.context("Shutdown signal handler failed")
}
