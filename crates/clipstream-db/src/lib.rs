//! # clipstream-db
//!
//! Storage for Credential Records. Two backends implement [`CredentialStore`]:
//! - **PostgreSQL**: the production store, via `sqlx`
//! - **Memory**: a process-local map for lite mode and tests

pub mod memory;
pub mod postgres;
pub mod repository;
pub mod store;

use std::sync::Arc;

use anyhow::Result;
use clipstream_common::config::DatabaseConfig;

pub use memory::MemoryCredentialStore;
pub use postgres::PgCredentialStore;
pub use store::CredentialStore;

/// Open the store selected by `database.url`.
///
/// PostgreSQL migrations run here unless `run_migrations` is false.
pub async fn connect(
    config: &DatabaseConfig,
    run_migrations: bool,
) -> Result<Arc<dyn CredentialStore>> {
    if config.is_in_memory() {
        tracing::warn!("Using the in-memory credential store; accounts vanish on restart");
        return Ok(Arc::new(MemoryCredentialStore::new()));
    }

    tracing::info!("Connecting to PostgreSQL...");
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect(&config.url)
        .await?;
    tracing::info!("Connected to PostgreSQL");

    if run_migrations {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Migrations complete");
    }

    Ok(Arc::new(PgCredentialStore::new(pool)))
}
