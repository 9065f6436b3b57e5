use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

mod auth;
mod config;
mod errors;
mod handlers;
mod models;
mod openapi;
mod routes;
mod seed;
mod services;
mod state;
mod store;

use config::Config;
use services::ledger::Ledger;
use state::AppState;
use store::{RemoteStore, postgres::PgDocumentStore, snapshot::SnapshotStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ─── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hr_ledger=debug,tower_http=info")),
        )
        .with_max_level(Level::TRACE)
        .init();

    // ─── Config ───────────────────────────────────────────────────────────────
    let config = Config::from_env()?;
    let addr = config.server_addr();

    // ─── Ledger ───────────────────────────────────────────────────────────────
    // The sync mode is decided once here and kept for the whole process.
    let documents = PgDocumentStore::from_url(config.database_url.as_deref())?;
    let ledger = Ledger::bootstrap(
        RemoteStore::new(Arc::new(documents)),
        SnapshotStore::new(&config.data_dir),
    )
    .await;
    info!("Ledger ready ({:?} mode) ✓", ledger.mode());

    // ─── App State ────────────────────────────────────────────────────────────
    let state = AppState::new(ledger.clone(), config);
    let app = routes::app(state);

    // ─── Start Server ─────────────────────────────────────────────────────────
    info!("🚀 HR Ledger API listening on http://{}", addr);
    info!("📖 Swagger UI:  http://{}/docs", addr);
    info!("❤️  Health:      http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Waiting for pending writes to finish");
    ledger.settle().await;
    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
