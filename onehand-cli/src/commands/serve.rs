//! HTTP server command
//!
//! Wires config into the server: pool, token issuer, blob store, notifier
//! and reservation policy.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use onehand_core::{OneHandConfig, ReservationPolicy};
use onehand_server::auth::TokenIssuer;
use onehand_server::db::migrations;
use onehand_server::notify::{HttpEmailNotifier, LogNotifier, Notifier};
use onehand_server::storage::LocalBlobStore;
use onehand_server::{run_server, AppState, ServerConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (overrides config; default 127.0.0.1:3030)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Who may unreserve an item: open or owner_only
    #[arg(long)]
    pub policy: Option<ReservationPolicy>,

    /// Run migrations before serving
    #[arg(long)]
    pub migrate: bool,
}

fn build_notifier(config: &OneHandConfig) -> Result<Arc<dyn Notifier>> {
    let notify = &config.notify;
    match notify.endpoint.as_deref().filter(|e| !e.is_empty()) {
        Some(endpoint) => {
            tracing::info!(endpoint, "email notifications enabled");
            let notifier = HttpEmailNotifier::new(
                endpoint,
                notify.api_key.clone(),
                notify.from.clone(),
                Duration::from_secs(notify.timeout_secs),
            )
            .context("Failed to build email client")?;
            Ok(Arc::new(notifier))
        }
        None => {
            tracing::warn!("no notify endpoint configured; emails will only be logged");
            Ok(Arc::new(LogNotifier))
        }
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let mut config = OneHandConfig::load().context("Failed to load config")?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(policy) = args.policy {
        config.reservations.policy = policy;
    }

    let secret = config.jwt_secret()?.to_string();
    let pool = super::connect(args.database_url, &config).await?;

    if args.migrate {
        migrations::run(&pool).await.context("Migrations failed")?;
    }

    let storage = &config.storage;
    tokio::fs::create_dir_all(&storage.root)
        .await
        .with_context(|| format!("Failed to create storage root {}", storage.root.display()))?;

    let tokens = TokenIssuer::new(
        &secret,
        chrono::Duration::hours(config.auth.token_ttl_hours),
        chrono::Duration::minutes(config.auth.reset_ttl_minutes),
    );
    let blobs = Arc::new(LocalBlobStore::new(&storage.root, &storage.public_base_url));
    let policy: ReservationPolicy = config.reservations.policy;

    let state = AppState::new(pool, tokens, blobs, build_notifier(&config)?, policy)
        .with_reset_url(&config.auth.reset_url);

    let server_config = ServerConfig {
        bind_addr: config.server.bind,
        cors_permissive: args.cors_permissive || config.server.cors_permissive,
        public_dir: Some(storage.root.clone()),
        max_body_bytes: storage.max_upload_bytes,
    };

    tracing::info!(
        bind = %server_config.bind_addr,
        policy = %policy,
        storage = %storage.root.display(),
        "Starting onehand server"
    );

    run_server(state, server_config)
        .await
        .context("Server error")?;

    Ok(())
}
