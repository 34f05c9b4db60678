//! Scan metrics sink.
//!
//! A [`ScanMetrics`] is created by the caller and shared with the scan
//! orchestrator, so separate scanner instances never share counters. It
//! tracks:
//! - `tls_scrapes_total{status}`: probes by outcome
//! - `tls_scrape_duration_seconds{domain}`: probe durations per target
//!
//! [`ScanMetrics::render`] produces the Prometheus text exposition format.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use strum::IntoEnumIterator;
use strum_macros::EnumIter as EnumIterMacro;

/// Outcome label of a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIterMacro)]
pub enum ScrapeStatus {
    /// A record was produced
    Success,
    /// The probe failed
    Failed,
}

impl ScrapeStatus {
    /// Label value used in the exposition format.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrapeStatus::Success => "success",
            ScrapeStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct DurationSummary {
    count: u64,
    sum_seconds: f64,
}

/// Thread-safe scan metrics.
pub struct ScanMetrics {
    scrapes: HashMap<ScrapeStatus, AtomicU64>,
    durations: Mutex<BTreeMap<String, DurationSummary>>,
    start_time: Instant,
}

impl Default for ScanMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanMetrics {
    /// Creates a sink with every counter at zero.
    pub fn new() -> Self {
        let mut scrapes = HashMap::new();
        for status in ScrapeStatus::iter() {
            scrapes.insert(status, AtomicU64::new(0));
        }
        Self {
            scrapes,
            durations: Mutex::new(BTreeMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Counts one probe with the given outcome.
    pub fn record(&self, status: ScrapeStatus) {
        if let Some(counter) = self.scrapes.get(&status) {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Number of probes recorded with `status`.
    pub fn scrapes(&self, status: ScrapeStatus) -> u64 {
        self.scrapes
            .get(&status)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Adds one duration observation for `target`.
    pub fn observe_duration(&self, target: &str, elapsed: Duration) {
        let mut durations = self
            .durations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let summary = durations.entry(target.to_string()).or_default();
        summary.count += 1;
        summary.sum_seconds += elapsed.as_secs_f64();
    }

    /// Observation count and total seconds for `target`.
    pub fn duration_summary(&self, target: &str) -> Option<(u64, f64)> {
        let durations = self
            .durations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        durations.get(target).map(|s| (s.count, s.sum_seconds))
    }

    /// Time since the sink was created.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Renders all metrics in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push_str("# HELP tls_scrapes_total Total number of targets scraped.\n");
        out.push_str("# TYPE tls_scrapes_total counter\n");
        for status in ScrapeStatus::iter() {
            let _ = writeln!(
                out,
                "tls_scrapes_total{{status=\"{}\"}} {}",
                status.as_str(),
                self.scrapes(status)
            );
        }

        out.push_str(
            "# HELP tls_scrape_duration_seconds Duration of the TLS scraping process in seconds.\n",
        );
        out.push_str("# TYPE tls_scrape_duration_seconds summary\n");
        let durations = self
            .durations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for (target, summary) in durations.iter() {
            let label = escape_label(target);
            let _ = writeln!(
                out,
                "tls_scrape_duration_seconds_sum{{domain=\"{label}\"}} {}",
                summary.sum_seconds
            );
            let _ = writeln!(
                out,
                "tls_scrape_duration_seconds_count{{domain=\"{label}\"}} {}",
                summary.count
            );
        }

        out
    }
}

fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
