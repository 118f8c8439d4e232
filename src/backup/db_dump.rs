// dbbackup/src/backup/db_dump.rs
use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::path::PathBuf;

use crate::config::BackupConfig;
use crate::runner::CommandRunner;

pub const PG_DUMP: &str = "pg_dump";

/// Artifact names follow `<db>_backup_<YYYYMMDD_HHMMSS>.sql`; the retention
/// stage matches on the same prefix.
pub fn artifact_prefix(db_name: &str) -> String {
    format!("{}_backup_", db_name)
}

/// Dumps the configured database to a timestamped plain-text SQL file inside
/// the backup directory and returns its path.
///
/// `pg_dump` must be resolvable on PATH; its absence is fatal and is detected
/// before anything is written. The database password is passed to the child
/// through `PGPASSWORD` only, never on the command line.
pub fn dump_database(config: &BackupConfig, runner: &dyn CommandRunner) -> Result<PathBuf> {
    let pg_dump_path = runner.resolve(PG_DUMP)?;
    println!("Found pg_dump executable at: {}", pg_dump_path.display());

    fs::create_dir_all(&config.backup_dir).with_context(|| {
        format!(
            "Failed to create backup directory: {}",
            config.backup_dir.display()
        )
    })?;

    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let dump_path = config
        .backup_dir
        .join(format!("{}{}.sql", artifact_prefix(&config.db_name), timestamp));

    println!(
        "🔍 Dumping database {} to {}",
        config.db_name,
        dump_path.display()
    );

    let port = config.db_port.to_string();
    let dump_file = dump_path.to_string_lossy().into_owned();
    let args = [
        "-h",
        config.db_host.as_str(),
        "-p",
        port.as_str(),
        "-U",
        config.db_user.as_str(),
        "-d",
        config.db_name.as_str(),
        "--format=plain",
        "--no-owner",
        "--no-acl",
        "-f",
        dump_file.as_str(),
    ];

    runner
        .execute(
            &pg_dump_path,
            &args,
            &[("PGPASSWORD", config.db_password.as_str())],
        )?
        .require_success(PG_DUMP)
        .with_context(|| format!("pg_dump failed for database {}", config.db_name))?;

    println!("✓ Database {} dumped successfully.", config.db_name);
    Ok(dump_path)
}
