// dbbackup/src/backup/retention.rs
//! Local retention: ages out dump artifacts in the backup directory.
//!
//! Unlike the remote prune in `object_store`, failures here propagate and
//! fail the run. The asymmetry is deliberate and mirrors the behavior the
//! tool has always had.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use super::db_dump::artifact_prefix;

const SECONDS_PER_DAY: u64 = 86_400;

/// Deletes local backup artifacts older than `retention_days`. A zero or
/// negative window disables pruning entirely. Returns the removed paths.
pub fn prune_local(backup_dir: &Path, db_name: &str, retention_days: i64) -> Result<Vec<PathBuf>> {
    prune_local_at(backup_dir, db_name, retention_days, SystemTime::now())
}

fn prune_local_at(
    backup_dir: &Path,
    db_name: &str,
    retention_days: i64,
    now: SystemTime,
) -> Result<Vec<PathBuf>> {
    if retention_days <= 0 {
        println!(
            "Local retention disabled (RETENTION_DAYS={}), skipping cleanup.",
            retention_days
        );
        return Ok(Vec::new());
    }
    if !backup_dir.is_dir() {
        return Ok(Vec::new());
    }

    println!(
        "🧹 Pruning local backups older than {} days in {}",
        retention_days,
        backup_dir.display()
    );

    let mut removed = Vec::new();
    for entry in fs::read_dir(backup_dir)
        .with_context(|| format!("Failed to read backup directory: {}", backup_dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !is_backup_artifact(name, db_name) {
            continue;
        }

        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .with_context(|| format!("Failed to read modification time of {}", path.display()))?;
        if is_expired(modified, now, retention_days) {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove expired backup {}", path.display()))?;
            println!("  Removed {}", path.display());
            removed.push(path);
        }
    }

    if removed.is_empty() {
        println!("✓ No local backups past the retention window.");
    } else {
        println!("✓ Removed {} expired local backup(s).", removed.len());
    }
    Ok(removed)
}

/// Matches `<db>_backup_*.sql.gz` plus stray uncompressed `.sql` files from
/// an interrupted earlier run.
fn is_backup_artifact(file_name: &str, db_name: &str) -> bool {
    file_name.starts_with(&artifact_prefix(db_name))
        && (file_name.ends_with(".sql.gz") || file_name.ends_with(".sql"))
}

/// Strictly older than the window: a file aged exactly `days` is retained.
fn is_expired(modified: SystemTime, now: SystemTime, days: i64) -> bool {
    let window = Duration::from_secs(days as u64 * SECONDS_PER_DAY);
    match now.duration_since(modified) {
        Ok(age) => age > window,
        // modification time in the future, never expire
        Err(_) => false,
    }
}
