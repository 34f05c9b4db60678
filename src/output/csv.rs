//! CSV target loading.

use std::path::Path;

use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;

/// Reads the targets listed under `header` in a CSV file.
///
/// The first row names the columns and `header` must match one exactly.
/// Rows too short to reach the column and blank cells are skipped.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, is empty, or has
/// no column named `header`.
pub fn read_targets_from_csv(path: &Path, header: &str) -> Result<Vec<String>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

    let mut rows = reader.records();
    let headers = match rows.next() {
        Some(row) => row.context("Failed to parse CSV header row")?,
        None => bail!("empty CSV file"),
    };
    let Some(column) = headers.iter().position(|h| h == header) else {
        bail!("column header '{header}' not found");
    };

    let mut targets = Vec::new();
    for row in rows {
        let row = row.context("Failed to parse CSV row")?;
        match row.get(column).map(str::trim) {
            Some(cell) if !cell.is_empty() => targets.push(cell.to_string()),
            _ => {}
        }
    }
    log::debug!(
        "Read {} target(s) from column '{header}' of {}",
        targets.len(),
        path.display()
    );
    Ok(targets)
}
