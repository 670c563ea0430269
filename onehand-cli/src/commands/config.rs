//! Config subcommands: show, init, path

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use onehand_core::OneHandConfig;

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective config (file + environment), secrets masked
    Show,
    /// Write a default config file
    Init(InitArgs),
    /// Show config file path
    Path,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Force overwrite existing config
    #[arg(long, short)]
    pub force: bool,
}

pub fn run_config(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show => run_show(),
        ConfigCommands::Init(args) => run_init(args),
        ConfigCommands::Path => {
            println!("{}", OneHandConfig::config_path().display());
            Ok(())
        }
    }
}

fn run_show() -> Result<()> {
    let config = OneHandConfig::load().context("Failed to load config")?;
    print!("{}", config.redacted().to_toml()?);
    Ok(())
}

fn run_init(args: InitArgs) -> Result<()> {
    let path = OneHandConfig::config_path();
    if path.exists() && !args.force {
        bail!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        );
    }

    OneHandConfig::default()
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}
