use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use db::DBService;
use services::services::{
    backup::{HouseholdBackup, export_household, import_household},
    config::Config,
};
use tracing::info;
use utils::logging::init_tracing;
use uuid::Uuid;

/// Export or restore a single household as JSON.
#[derive(Debug, Parser)]
#[command(name = "household-backup", version)]
struct Cli {
    /// Database to operate on; defaults to the server's configured database.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write a household and everything it owns to a file.
    Export {
        household_id: Uuid,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long)]
        force: bool,
    },
    /// Restore a household from a file written by `export`.
    Import { input: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("info,sqlx=warn");
    // Loads `.env` before clap reads DATABASE_URL.
    let config = Config::from_env();
    let cli = Cli::parse();

    let database_url = cli.database_url.unwrap_or(config.database_url);
    let db = DBService::new(&database_url)
        .await
        .with_context(|| format!("failed to open {database_url}"))?;

    match cli.command {
        Command::Export {
            household_id,
            output,
            force,
        } => {
            if output.exists() && !force {
                bail!("{} already exists, pass --force to overwrite", output.display());
            }
            let backup = export_household(&db.pool, household_id).await?;
            let json = serde_json::to_vec_pretty(&backup)?;
            tokio::fs::write(&output, json)
                .await
                .with_context(|| format!("failed to write {}", output.display()))?;
            info!(
                rows = backup.row_count(),
                "Exported household {} to {}",
                household_id,
                output.display()
            );
        }
        Command::Import { input } => {
            let raw = tokio::fs::read(&input)
                .await
                .with_context(|| format!("failed to read {}", input.display()))?;
            let backup: HouseholdBackup = serde_json::from_slice(&raw)
                .with_context(|| format!("{} is not a household backup", input.display()))?;
            let household = import_household(&db.pool, &backup).await?;
            info!(
                rows = backup.row_count(),
                "Imported household '{}' ({}), invite code {}",
                household.name,
                household.id,
                household.invite_code
            );
        }
    }
    Ok(())
}
