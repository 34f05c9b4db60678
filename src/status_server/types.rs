//! Status server data structures.

use serde::Serialize;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use crate::metrics::ScanMetrics;

/// Shared state for the status server
#[derive(Clone)]
pub struct StatusState {
    /// Metrics sink the scanner writes to
    pub metrics: Arc<ScanMetrics>,
    /// Number of targets queued for this run (0 until known)
    pub total_targets: Arc<AtomicUsize>,
}

impl StatusState {
    /// Wraps a metrics sink with an unknown target count.
    pub fn new(metrics: Arc<ScanMetrics>) -> Self {
        Self {
            metrics,
            total_targets: Arc::new(AtomicUsize::new(0)),
        }
    }
}

/// JSON response for `/status` endpoint
#[derive(Serialize)]
pub struct StatusResponse {
    /// Targets queued so far
    pub total_targets: usize,
    /// Targets that produced a record
    pub succeeded: u64,
    /// Targets that failed
    pub failed: u64,
    /// Queued targets not yet attempted
    pub pending: u64,
    /// Attempted share of queued targets
    pub percentage_complete: f64,
    /// Seconds since the metrics sink was created
    pub elapsed_seconds: f64,
    /// Attempts per second
    pub rate_per_second: f64,
}
