use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{error, info};

use crate::state::Persistence;
use crate::store::postgres::PgApplicationStore;

/// Creates a PostgreSQL connection pool and applies pending migrations.
/// The whole attempt is bounded by `connect_timeout`.
pub async fn create_pool(database_url: &str, connect_timeout: Duration) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = tokio::time::timeout(
        connect_timeout,
        PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(connect_timeout)
            .connect(database_url),
    )
    .await
    .with_context(|| format!("Timed out after {connect_timeout:?} connecting to PostgreSQL"))??;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to apply database migrations")?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Connects the record store, falling back to degraded mode when the
/// database is unreachable. Returns the pool so it can be closed on shutdown.
pub async fn connect_persistence(
    database_url: &str,
    connect_timeout: Duration,
) -> (Persistence, Option<PgPool>) {
    match create_pool(database_url, connect_timeout).await {
        Ok(pool) => {
            let store = PgApplicationStore::new(pool.clone());
            (Persistence::Connected(Arc::new(store)), Some(pool))
        }
        Err(e) => {
            error!("PostgreSQL connection failed, running in degraded mode: {e:#}");
            (Persistence::Degraded, None)
        }
    }
}
