//! Database Backup Tool
//!
//! Dumps a PostgreSQL database, compresses the dump, optionally uploads it to
//! an S3-compatible object store and prunes old backups by age.

// dbbackup/src/main.rs
mod backup;
mod config;
mod errors;
mod runner;

use anyhow::{Context, Result};
use config::BackupConfig;
use runner::SystemRunner;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match run_app().await {
        Ok(_) => {
            println!("✅ Operation completed successfully.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_app() -> Result<()> {
    let config = BackupConfig::resolve().context("Failed to resolve backup configuration")?;
    backup::run_backup_flow(&config, &SystemRunner).await
}
