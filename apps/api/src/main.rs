//! # Stockroom API
//!
//! HTTP server for the inventory and sales ledger.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom API Server                             │
//! │                                                                         │
//! │  Front end ───► HTTP (8000) ───► Routes ───► stockroom-db ───► SQLite  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use stockroom_api::telemetry::init_tracing;
use stockroom_api::{build_router, ApiConfig, AppState};
use stockroom_db::{Database, DbConfig};
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration first so the log format is known
    let config = ApiConfig::load()?;
    init_tracing(config.log_json);

    info!(
        addr = %config.bind_addr,
        database = %config.database_path.display(),
        max_connections = config.db_max_connections,
        "Configuration loaded"
    );

    let db = Database::new(
        DbConfig::new(&config.database_path).max_connections(config.db_max_connections),
    )
    .await?;
    info!("Database ready");

    let app = build_router(AppState::new(db.clone()), config.max_upload_bytes);

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "Starting HTTP server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
