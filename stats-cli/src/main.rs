//! listenstats: write and inspect listen stats. Store config from env.

use anyhow::{Context, Result};
use clap::Parser;
use stats_cli::{execute, Cli, StatsConfig};
use stats_core::init_tracing;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = StatsConfig::load()?;
    config.validate()?;
    init_tracing(config.log_file.as_deref())?;
    debug!(backend = ?config.store_backend, "Loaded stats config");

    let store = config
        .build_store()
        .await
        .context("Failed to connect to stats store")?;
    let output = execute(cli.command, store).await?;
    println!("{}", output);
    Ok(())
}
