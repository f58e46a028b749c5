//! # NanoTrade API Server
//!
//! ```text
//! nanotrade.toml / NANOTRADE_* ──► ServerConfig
//!                                      │
//!            SQLite (migrations) ◄─────┤
//!                                      ▼
//!           client ──► HTTP :8000 ──► axum router ──► repositories
//! ```

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use nanotrade_api::{build_router, AppState, ServerConfig};
use nanotrade_db::{Database, DbConfig};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,nanotrade=debug,tower_http=debug")),
        )
        .with_target(true)
        .init();

    info!("Starting NanoTrade API server...");

    // Load configuration
    let config = ServerConfig::load().context("failed to load configuration")?;
    info!(
        bind = %config.bind_addr,
        database = %config.database_path.display(),
        media = %config.media_dir.display(),
        "Configuration loaded"
    );
    if config.uses_dev_secret() {
        warn!("Using the development JWT secret; set NANOTRADE_JWT_SECRET in production");
    }

    // Open database (runs migrations)
    let db = Database::new(DbConfig::new(config.database_path.clone()))
        .await
        .context("failed to open database")?;

    let purged = db.tokens().purge_expired(Utc::now()).await?;
    if purged > 0 {
        info!(purged, "Purged expired token revocations");
    }

    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(db, config));
    let app = build_router(state.clone());

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!(addr = %bind_addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    state.db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
