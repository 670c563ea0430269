//! Schema migration command

use anyhow::{Context, Result};
use clap::Parser;
use onehand_core::OneHandConfig;
use onehand_server::db::migrations;

#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,
}

pub async fn run_migrate(args: MigrateArgs) -> Result<()> {
    let config = OneHandConfig::load().context("Failed to load config")?;
    let pool = super::connect(args.database_url, &config).await?;

    migrations::run(&pool).await.context("Migrations failed")?;
    tracing::info!("Schema is up to date");
    Ok(())
}
