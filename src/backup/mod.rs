mod logic;
pub(crate) mod archive;
pub(crate) mod db_dump;
pub(crate) mod object_store;
pub(crate) mod retention;

use anyhow::Result;

use crate::config::BackupConfig;
use crate::runner::CommandRunner;

/// Public entry point for one backup run.
pub async fn run_backup_flow(config: &BackupConfig, runner: &dyn CommandRunner) -> Result<()> {
    logic::perform_backup_orchestration(config, runner).await
}
