//! # Saori API server
//!
//! ```text
//! load config ──► resolve JWT secret ──► open SQLite + migrate ──► serve /api
//! ```

use anyhow::Context;
use saori_api::auth::JwtManager;
use saori_api::{build_router, ApiConfig, AppState};
use saori_db::{Database, DbConfig};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,saori_api=debug,saori_db=debug,tower_http=info")),
        )
        .with_target(true)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Saori API server");

    let config = ApiConfig::load().context("loading configuration")?;
    let secret = config.resolve_jwt_secret().context("resolving JWT secret")?;

    let database_path = config.database_path();
    if let Some(parent) = database_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating data directory {}", parent.display()))?;
    }
    info!(path = %database_path.display(), "Configuration loaded");

    let db = Database::new(DbConfig::new(&database_path))
        .await
        .context("opening database")?;

    let jwt = JwtManager::new(
        &secret,
        config.jwt_access_lifetime_secs,
        config.jwt_refresh_lifetime_secs,
    );
    let address = config.bind_address();
    let state = AppState::new(db.clone(), jwt, config);

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    info!(%address, "Listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
