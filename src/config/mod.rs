// dbbackup/src/config/mod.rs
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Optional local settings file, `KEY=VALUE` lines with `#` comments.
/// Values from this file never override variables already set in the
/// environment; both override only the built-in defaults.
pub const SETTINGS_FILE: &str = "backup.env";

/// Resolved once at startup and passed by reference to every stage.
/// Every field has a default except the object-store key pair: when either
/// key is empty the upload stage is skipped, not failed.
#[derive(Debug, Clone)]
pub struct BackupConfig {
    pub db_host: String,
    pub db_port: u16,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
    pub s3_endpoint: String,
    pub s3_access_key: String,
    pub s3_secret_key: String,
    pub s3_use_ssl: bool,
    pub s3_bucket: String,
    pub backup_dir: PathBuf,
    pub retention_days: i64,
}

impl BackupConfig {
    pub fn resolve() -> Result<Self> {
        Self::resolve_with_settings(Path::new(SETTINGS_FILE))
    }

    pub fn resolve_with_settings(settings_path: &Path) -> Result<Self> {
        if settings_path.exists() {
            // dotenv leaves pre-existing environment variables untouched,
            // which gives the precedence order: defaults < file < environment.
            dotenv::from_path(settings_path).with_context(|| {
                format!("Failed to load settings file {}", settings_path.display())
            })?;
            println!("📄 Loaded settings from {}", settings_path.display());
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup (the environment in
    /// production, a plain map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let db_port: u16 = get("DATABASE_PORT", "5432")
            .parse()
            .context("DATABASE_PORT must be a valid port number")?;
        let retention_days: i64 = get("RETENTION_DAYS", "30")
            .parse()
            .context("RETENTION_DAYS must be an integer number of days")?;

        Ok(BackupConfig {
            db_host: get("DATABASE_HOST", "localhost"),
            db_port,
            db_name: get("DATABASE_NAME", "exchange"),
            db_user: get("DATABASE_USER", "exchange"),
            db_password: get("DATABASE_PASSWORD", "exchange"),
            s3_endpoint: get("S3_ENDPOINT", "localhost:9000"),
            s3_access_key: get("S3_ACCESS_KEY", ""),
            s3_secret_key: get("S3_SECRET_KEY", ""),
            s3_use_ssl: parse_bool(&get("S3_USE_SSL", "false")),
            s3_bucket: get("S3_BUCKET", "database-backups"),
            backup_dir: PathBuf::from(get("BACKUP_DIR", "./backups")),
            retention_days,
        })
    }

    /// Upload runs only when both halves of the key pair are present.
    pub fn upload_enabled(&self) -> bool {
        !self.s3_access_key.is_empty() && !self.s3_secret_key.is_empty()
    }

    /// Full endpoint URL for the object store, scheme chosen by the TLS flag.
    pub fn s3_url(&self) -> String {
        let scheme = if self.s3_use_ssl { "https" } else { "http" };
        format!("{}://{}", scheme, self.s3_endpoint)
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}
