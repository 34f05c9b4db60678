//! Scan finalization.
//!
//! This module contains the `finalize_scan` function which stops background
//! tasks, prints failure statistics, and builds the report.

use log::info;

use crate::error_handling::FailureStats;

use super::init::ScanResources;
use super::task::RunOutcome;
use super::ScanReport;

/// Finalize a scan run and produce the final report.
pub(super) fn finalize_scan(resources: ScanResources, outcome: RunOutcome) -> ScanReport {
    if let Some(server) = resources.status_server {
        server.abort();
    }

    let elapsed_seconds = resources.start_time.elapsed().as_secs_f64();
    let failed = outcome.failures.len();
    let total_targets = outcome.successful + failed;

    info!(
        "Run statistics: total={}, successful={}, failed={}",
        total_targets, outcome.successful, failed
    );
    let stats = FailureStats::new();
    stats.record_all(&outcome.failures);
    print_failure_statistics(&stats);

    ScanReport {
        total_targets,
        successful: outcome.successful,
        failed,
        elapsed_seconds,
        failures: outcome.failures,
        bundle_path: outcome.bundle_path,
    }
}

/// Prints failure counts by kind to the log.
fn print_failure_statistics(stats: &FailureStats) {
    let total = stats.total();
    if total == 0 {
        return;
    }
    info!("Failure Counts ({} total):", total);
    for (kind, count) in stats.non_zero() {
        info!("   {}: {}", kind.as_str(), count);
    }
}
