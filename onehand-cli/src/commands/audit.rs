//! Reservation integrity audit
//!
//! Lists items where `is_sold` and `reserved_by` disagree. Exits non-zero
//! when any are found so it can run from cron or CI.

use anyhow::{bail, Context, Result};
use clap::Parser;
use onehand_core::OneHandConfig;
use onehand_server::db::{Item, ItemRepo};
use serde::Serialize;
use uuid::Uuid;

#[derive(Parser, Debug)]
pub struct AuditArgs {
    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Print findings as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct Finding {
    item_id: Uuid,
    is_sold: bool,
    reserved_by: Option<Uuid>,
    problem: String,
}

impl From<&Item> for Finding {
    fn from(item: &Item) -> Self {
        let problem = match item.reservation() {
            Err(violation) => violation.to_string(),
            Ok(_) => "consistent".to_string(),
        };
        Self {
            item_id: item.id,
            is_sold: item.is_sold,
            reserved_by: item.reserved_by,
            problem,
        }
    }
}

pub async fn run_audit(args: AuditArgs) -> Result<()> {
    let config = OneHandConfig::load().context("Failed to load config")?;
    let pool = super::connect(args.database_url, &config).await?;

    let items = ItemRepo::new(&pool)
        .integrity_violations()
        .await
        .context("Audit query failed")?;
    let findings: Vec<Finding> = items.iter().map(Finding::from).collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&findings)?);
    } else if findings.is_empty() {
        println!("All items consistent");
    } else {
        for f in &findings {
            println!("{}  {}", f.item_id, f.problem);
        }
    }

    if !findings.is_empty() {
        bail!("{} item(s) have inconsistent reservation columns", findings.len());
    }
    Ok(())
}
