mod config;
mod db;
mod errors;
mod models;
mod routes;
mod state;
mod store;
mod uploads;
mod validation;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::connect_persistence;
use crate::routes::build_router;
use crate::state::AppState;
use crate::uploads::ResumeStorage;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    init_tracing(&config);

    info!(
        "Starting Job Application API v{} ({})",
        env!("CARGO_PKG_VERSION"),
        config.environment.as_str()
    );

    let resumes = ResumeStorage::new(&config.upload_dir);
    resumes.ensure_dir().await.with_context(|| {
        format!(
            "Failed to create upload directory {}",
            config.upload_dir.display()
        )
    })?;
    info!("Storing resumes in {}", resumes.dir().display());

    // A missing database degrades the service instead of stopping it
    let (persistence, pool) =
        connect_persistence(&config.database_url, config.db_connect_timeout).await;

    if !persistence.is_connected() {
        warn!("Serving in degraded mode: /api routes answer 503 until restart");
    }

    let state = AppState::new(persistence, resumes);

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = pool {
        pool.close().await;
        info!("PostgreSQL connection pool closed");
    }
    info!("Server stopped");

    Ok(())
}

/// Human-readable logs locally, JSON lines in production.
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{crate_name}={level},tower_http={level}",
            crate_name = env!("CARGO_CRATE_NAME"),
            level = &config.rust_log
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.environment.is_production() {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
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
