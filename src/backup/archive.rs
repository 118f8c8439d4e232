// dbbackup/src/backup/archive.rs
use anyhow::{Context, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

/// Gzip-compresses `source` in place: writes a `.gz` sibling and removes the
/// uncompressed original. Returns the path of the compressed file.
pub fn compress_file(source: &Path) -> Result<PathBuf> {
    let mut dest_name = source.as_os_str().to_owned();
    dest_name.push(".gz");
    let dest = PathBuf::from(dest_name);

    println!("🗜 Compressing {}", source.display());

    let mut input = File::open(source)
        .with_context(|| format!("Failed to open dump file: {}", source.display()))?;
    let output = File::create(&dest)
        .with_context(|| format!("Failed to create archive file: {}", dest.display()))?;
    let mut encoder = GzEncoder::new(output, Compression::default());

    io::copy(&mut input, &mut encoder)
        .with_context(|| format!("Failed to compress {}", source.display()))?;
    encoder
        .finish()
        .with_context(|| format!("Failed to finish Gzip encoding for {}", dest.display()))?;

    fs::remove_file(source).with_context(|| {
        format!(
            "Failed to remove uncompressed dump file: {}",
            source.display()
        )
    })?;

    let size = fs::metadata(&dest)
        .with_context(|| format!("Failed to stat archive file: {}", dest.display()))?
        .len();
    println!(
        "✅ Backup compressed to {} ({} bytes)",
        dest.display(),
        size
    );
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    #[test]
    fn compresses_in_place_and_round_trips() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let dump = dir.path().join("exchange_backup_20250101_120000.sql");
        let content = b"CREATE TABLE trades (id bigint);\nINSERT INTO trades VALUES (1);\n";
        fs::write(&dump, content)?;

        let archive = compress_file(&dump)?;

        assert_eq!(
            archive.file_name().unwrap().to_string_lossy(),
            "exchange_backup_20250101_120000.sql.gz"
        );
        assert!(!dump.exists(), "original must be removed");

        let mut decoder = GzDecoder::new(File::open(&archive)?);
        let mut restored = Vec::new();
        decoder.read_to_end(&mut restored)?;
        assert_eq!(restored, content);
        Ok(())
    }

    #[test]
    fn missing_source_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let result = compress_file(&dir.path().join("nope.sql"));
        assert!(result.is_err());
    }
}
