// dbbackup/src/backup/object_store.rs
//! Upload stage: drives the MinIO `mc` client to push the compressed backup
//! into an S3-compatible bucket and to age out old remote objects.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::BackupConfig;
use crate::runner::CommandRunner;

pub const MC: &str = "mc";

/// Connection alias registered with the client for this run.
const ALIAS: &str = "backup";

const MC_DOWNLOAD_BASE: &str = "https://dl.min.io/client/mc/release";

/// Outcome of the upload stage. Skipping (no credentials) is an expected,
/// recoverable branch; every failure path is an `Err` instead.
#[derive(Debug)]
pub enum UploadOutcome {
    Uploaded,
    Skipped(String),
}

/// Handle to the `mc` binary. When the client had to be downloaded, the
/// temporary directory holding it is removed when the handle is dropped at
/// the end of the run.
pub struct ObjectStoreClient {
    program: PathBuf,
    _download_dir: Option<TempDir>,
}

/// Uploads `artifact` into the configured bucket, then prunes remote objects
/// older than the retention window (best effort).
///
/// Runs only when both object-store keys are non-empty; otherwise the backup
/// stays on local disk and the run continues with a warning.
pub async fn upload_backup(
    config: &BackupConfig,
    runner: &dyn CommandRunner,
    artifact: &Path,
) -> Result<UploadOutcome> {
    if !config.upload_enabled() {
        let reason =
            "S3 credentials not configured; backup was NOT uploaded and exists on local disk only"
                .to_string();
        println!("⚠️ Upload skipped: {}", reason);
        return Ok(UploadOutcome::Skipped(reason));
    }

    let client = ensure_client(runner).await?;
    configure_alias(&client, config, runner)?;
    ensure_bucket(&client, config, runner)?;
    copy_artifact(&client, config, runner, artifact)?;

    // Remote prune runs only after a successful upload and never fails the run.
    if config.retention_days > 0 {
        prune_remote(&client, config, runner);
    } else {
        println!(
            "Remote retention disabled (RETENTION_DAYS={}), skipping cleanup.",
            config.retention_days
        );
    }

    Ok(UploadOutcome::Uploaded)
}

/// Finds `mc` on PATH, downloading a platform-matched static binary into a
/// temporary directory when absent.
pub async fn ensure_client(runner: &dyn CommandRunner) -> Result<ObjectStoreClient> {
    match runner.resolve(MC) {
        Ok(program) => {
            println!("Found mc client at: {}", program.display());
            Ok(ObjectStoreClient {
                program,
                _download_dir: None,
            })
        }
        Err(_) => download_client().await,
    }
}

fn client_download_url() -> Result<String> {
    let os = match std::env::consts::OS {
        "linux" => "linux",
        "macos" => "darwin",
        other => bail!("No mc client download available for OS '{}'", other),
    };
    let arch = match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" | "arm64" => "arm64",
        other => bail!("No mc client download available for architecture '{}'", other),
    };
    Ok(format!("{}/{}-{}/mc", MC_DOWNLOAD_BASE, os, arch))
}

async fn download_client() -> Result<ObjectStoreClient> {
    let url = client_download_url()?;
    println!("⬇ mc client not found on PATH, downloading from {}", url);

    let bytes = reqwest::get(&url)
        .await
        .with_context(|| format!("Failed to download mc client from {}", url))?
        .error_for_status()
        .with_context(|| format!("mc client download from {} was rejected", url))?
        .bytes()
        .await
        .context("Failed to read mc client download body")?;

    let dir = TempDir::new().context("Failed to create temporary directory for mc client")?;
    let program = dir.path().join(MC);
    fs::write(&program, &bytes)
        .with_context(|| format!("Failed to write mc client to {}", program.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&program, fs::Permissions::from_mode(0o755))
            .with_context(|| format!("Failed to mark {} executable", program.display()))?;
    }

    println!("✓ mc client downloaded to {}", program.display());
    Ok(ObjectStoreClient {
        program,
        _download_dir: Some(dir),
    })
}

fn configure_alias(
    client: &ObjectStoreClient,
    config: &BackupConfig,
    runner: &dyn CommandRunner,
) -> Result<()> {
    let endpoint_url = config.s3_url();
    runner
        .execute(
            &client.program,
            &[
                "alias",
                "set",
                ALIAS,
                endpoint_url.as_str(),
                config.s3_access_key.as_str(),
                config.s3_secret_key.as_str(),
                "--api",
                "S3v4",
            ],
            &[],
        )?
        .require_success(MC)
        .with_context(|| format!("Failed to register mc alias for {}", endpoint_url))?;
    Ok(())
}

/// Creates the target bucket; an already existing bucket is not an error.
fn ensure_bucket(
    client: &ObjectStoreClient,
    config: &BackupConfig,
    runner: &dyn CommandRunner,
) -> Result<()> {
    let bucket_uri = format!("{}/{}", ALIAS, config.s3_bucket);
    let output = runner.execute(&client.program, &["mb", bucket_uri.as_str()], &[])?;
    if output.success() {
        println!("✓ Bucket {} ready.", config.s3_bucket);
        return Ok(());
    }
    let combined = format!("{}{}", output.stdout, output.stderr).to_lowercase();
    if combined.contains("already exist") || combined.contains("already own") {
        println!("Bucket {} already exists.", config.s3_bucket);
        return Ok(());
    }
    output
        .require_success(MC)
        .with_context(|| format!("Failed to create bucket {}", config.s3_bucket))?;
    Ok(())
}

fn copy_artifact(
    client: &ObjectStoreClient,
    config: &BackupConfig,
    runner: &dyn CommandRunner,
    artifact: &Path,
) -> Result<()> {
    let file_name = artifact
        .file_name()
        .and_then(|n| n.to_str())
        .context("Backup artifact has no valid file name")?;
    let object_uri = format!("{}/{}/{}", ALIAS, config.s3_bucket, file_name);
    let artifact_str = artifact.to_string_lossy();

    println!("☁ Uploading {} to {}", artifact.display(), object_uri);
    runner
        .execute(
            &client.program,
            &["cp", artifact_str.as_ref(), object_uri.as_str()],
            &[],
        )?
        .require_success(MC)
        .with_context(|| format!("Failed to upload {} to bucket", artifact.display()))?;

    println!("✅ Backup uploaded as {}", object_uri);
    Ok(())
}

/// Force-deletes remote objects older than the retention window. Failures are
/// swallowed: the current backup is already stored, a missed prune must not
/// fail the run.
fn prune_remote(client: &ObjectStoreClient, config: &BackupConfig, runner: &dyn CommandRunner) {
    let bucket_uri = format!("{}/{}", ALIAS, config.s3_bucket);
    let older_than = format!("{}d", config.retention_days);
    println!(
        "🧹 Pruning remote backups older than {} days in {}",
        config.retention_days, bucket_uri
    );

    let result = runner.execute(
        &client.program,
        &[
            "rm",
            "--recursive",
            "--force",
            "--older-than",
            older_than.as_str(),
            bucket_uri.as_str(),
        ],
        &[],
    );
    match result {
        Ok(output) if output.success() => {
            println!("✓ Remote retention cleanup done.");
        }
        Ok(output) => {
            eprintln!(
                "⚠️ Remote retention cleanup failed (ignored): {}",
                output.stderr.trim()
            );
        }
        Err(e) => {
            eprintln!("⚠️ Remote retention cleanup failed (ignored): {}", e);
        }
    }
}
