// dbbackup/src/backup/logic.rs
//! Sequential backup pipeline:
//! dump → compress → (upload skipped | upload → remote prune) → local prune.
//!
//! Dump, compression and upload failures abort the run; the remote prune is
//! best effort inside the upload stage; local prune errors propagate.

use anyhow::{Context, Result};

use super::object_store::UploadOutcome;
use super::{archive, db_dump, object_store, retention};
use crate::config::BackupConfig;
use crate::runner::CommandRunner;

pub async fn perform_backup_orchestration(
    config: &BackupConfig,
    runner: &dyn CommandRunner,
) -> Result<()> {
    println!("🚀 Starting backup of database '{}'", config.db_name);

    let dump_path =
        db_dump::dump_database(config, runner).context("Database dump stage failed")?;

    let artifact = archive::compress_file(&dump_path).context("Compression stage failed")?;

    match object_store::upload_backup(config, runner, &artifact)
        .await
        .context("Upload stage failed")?
    {
        UploadOutcome::Uploaded => {}
        UploadOutcome::Skipped(_) => {
            // Already logged by the upload stage; the run still succeeds.
        }
    }

    retention::prune_local(&config.backup_dir, &config.db_name, config.retention_days)
        .context("Local retention cleanup failed")?;

    println!("🎉 Backup run completed.");
    Ok(())
}
