//! Scan driver.
//!
//! Turns a [`Config`] into a finished run: sets up shared resources, feeds
//! targets through the scanner batch by batch, emits every record, and
//! summarizes the failures.

mod finalize;
mod init;
mod task;

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::address::parse_ip_or_subnet;
use crate::config::{Config, ScanTarget};
use crate::error_handling::MultiTargetError;
use crate::output::read_targets_from_csv;

use finalize::finalize_scan;
use init::init_scan_resources;
use task::{scan_address_range, scan_domain_list};

/// Results of a scan run.
#[derive(Debug)]
pub struct ScanReport {
    /// Number of targets probed
    pub total_targets: usize,
    /// Number of targets that produced a record
    pub successful: usize,
    /// Number of targets that failed
    pub failed: usize,
    /// Elapsed time in seconds
    pub elapsed_seconds: f64,
    /// Every failed target with its error
    pub failures: MultiTargetError,
    /// Bundle file written when `--bundle` is set and something succeeded
    pub bundle_path: Option<PathBuf>,
}

/// Runs a scan with the provided configuration.
///
/// Per-target failures never fail the run; they are reported in
/// [`ScanReport::failures`]. Structural problems do.
///
/// # Errors
///
/// Returns an error if:
/// - The configuration is invalid
/// - The CSV input cannot be read or lacks the requested column
/// - The IP address or subnet cannot be parsed
/// - The TLS client or HTTP client cannot be built
///
/// # Example
///
/// ```no_run
/// use tls_scrape::{run_scan, Config};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config {
///     fqdn: Some("example.com".to_string()),
///     ..Default::default()
/// };
/// let report = run_scan(config).await?;
/// println!("{} of {} targets scanned", report.successful, report.total_targets);
/// # Ok(())
/// # }
/// ```
pub async fn run_scan(config: Config) -> Result<ScanReport> {
    let resources = init_scan_resources(config).await?;

    let outcome = match resources.config.target()? {
        ScanTarget::Domain(domain) => scan_domain_list(&resources, vec![domain]).await?,
        ScanTarget::CsvFile { path, header } => {
            let domains = read_targets_from_csv(&path, &header)
                .with_context(|| format!("error reading CSV {}", path.display()))?;
            scan_domain_list(&resources, domains).await?
        }
        ScanTarget::Address(input) | ScanTarget::Subnet(input) => {
            let range = parse_ip_or_subnet(&input).context("Error parsing IP or subnet")?;
            scan_address_range(&resources, &range).await?
        }
    };

    Ok(finalize_scan(resources, outcome))
}
