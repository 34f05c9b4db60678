//! JSON record files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use log::info;
use serde::Serialize;

use crate::config::{BUNDLE_FILE_PREFIX, BUNDLE_TIMESTAMP_FORMAT};
use crate::models::{AddressCertificateRecord, CertificateRecord};

/// A record written to its own `<stem>.json` file.
pub trait JsonRecord: Serialize {
    /// File name without the extension.
    fn file_stem(&self) -> &str;
}

impl JsonRecord for CertificateRecord {
    fn file_stem(&self) -> &str {
        &self.domain
    }
}

impl JsonRecord for AddressCertificateRecord {
    fn file_stem(&self) -> &str {
        &self.ip
    }
}

fn encode<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<Vec<u8>> {
    let mut data = if pretty {
        serde_json::to_vec_pretty(value)
    } else {
        serde_json::to_vec(value)
    }
    .context("Failed to serialize record")?;
    // Trailing newline keeps `tail` and friends happy
    data.push(b'\n');
    Ok(data)
}

/// Writes one record to `<dir>/<stem>.json`, creating `dir` if needed.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub async fn write_json<R: JsonRecord>(dir: &Path, record: &R, pretty: bool) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let path = dir.join(format!("{}.json", record.file_stem()));
    tokio::fs::write(&path, encode(record, pretty)?)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Writes all records as one JSON array to a timestamped bundle file.
///
/// Returns `Ok(None)` without touching the filesystem when `records` is empty.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub async fn write_bundled_json<R: Serialize>(
    dir: &Path,
    records: &[R],
    pretty: bool,
) -> Result<Option<PathBuf>> {
    if records.is_empty() {
        return Ok(None);
    }
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let timestamp = Local::now().format(BUNDLE_TIMESTAMP_FORMAT);
    let path = dir.join(format!("{BUNDLE_FILE_PREFIX}{timestamp}.json"));
    tokio::fs::write(&path, encode(records, pretty)?)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!(
        "Bundled {} certificate details into {}",
        records.len(),
        path.display()
    );
    Ok(Some(path))
}
