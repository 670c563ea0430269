//! Command implementations for the onehand CLI

pub mod audit;
pub mod config;
pub mod migrate;
pub mod serve;

pub use audit::run_audit;
pub use config::run_config;
pub use migrate::run_migrate;
pub use serve::run_serve;

use anyhow::{Context, Result};
use onehand_core::OneHandConfig;
use onehand_server::db::{create_pool_with_options, PgPool};

/// Open a pool from `--database-url` or the loaded config.
pub(crate) async fn connect(database_url: Option<String>, config: &OneHandConfig) -> Result<PgPool> {
    let url = match database_url {
        Some(url) => url,
        None => config.database_url()?.to_string(),
    };

    create_pool_with_options(&url, config.database.max_connections)
        .await
        .context("Failed to create database pool")
}
