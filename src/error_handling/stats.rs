//! Failure statistics tracking.
//!
//! Per-kind counts of the failures collected during a run.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::aggregate::MultiTargetError;
use super::types::FailureKind;

/// Per-kind failure counters, filled from the run's aggregated failures.
///
/// Every [`FailureKind`] starts at zero, so [`FailureStats::get`] reports
/// kinds that never occurred.
pub struct FailureStats {
    failures: HashMap<FailureKind, AtomicUsize>,
}

impl Default for FailureStats {
    fn default() -> Self {
        Self::new()
    }
}

impl FailureStats {
    /// Creates a tracker with all counters at zero.
    pub fn new() -> Self {
        let mut failures = HashMap::new();
        for kind in FailureKind::iter() {
            failures.insert(kind, AtomicUsize::new(0));
        }
        FailureStats { failures }
    }

    /// Increments the counter for `kind`.
    pub fn increment(&self, kind: FailureKind) {
        if let Some(counter) = self.failures.get(&kind) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment failure counter for {:?} which is not in the map. \
                 This indicates a bug in FailureStats initialization.",
                kind
            );
        }
    }

    /// Counts every entry of an aggregated error.
    pub fn record_all(&self, errors: &MultiTargetError) {
        for (_, error) in errors.iter() {
            self.increment(error.kind());
        }
    }

    /// Returns the count for `kind`.
    pub fn get(&self, kind: FailureKind) -> usize {
        self.failures
            .get(&kind)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Sum of all counters.
    pub fn total(&self) -> usize {
        self.failures
            .values()
            .map(|c| c.load(Ordering::SeqCst))
            .sum()
    }

    /// Non-zero counters, largest first.
    pub fn non_zero(&self) -> Vec<(FailureKind, usize)> {
        let mut counts: Vec<_> = FailureKind::iter()
            .map(|k| (k, self.get(k)))
            .filter(|(_, n)| *n > 0)
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handling::ScanError;

    #[test]
    fn test_failure_stats_initialization() {
        let stats = FailureStats::new();
        for kind in FailureKind::iter() {
            assert_eq!(stats.get(kind), 0);
        }
        assert_eq!(stats.total(), 0);
        assert!(stats.non_zero().is_empty());
    }

    #[test]
    fn test_record_all_counts_by_kind() {
        let mut errors = MultiTargetError::new();
        errors.insert(
            "a",
            ScanError::DialFailure {
                target: "a:443".to_string(),
                reason: "refused".to_string(),
            },
        );
        errors.insert(
            "b",
            ScanError::DialFailure {
                target: "b:443".to_string(),
                reason: "refused".to_string(),
            },
        );
        errors.insert("c", ScanError::NoCertificates("c:443".to_string()));

        let stats = FailureStats::new();
        stats.record_all(&errors);

        assert_eq!(stats.get(FailureKind::Dial), 2);
        assert_eq!(stats.get(FailureKind::NoCertificates), 1);
        assert_eq!(stats.total(), 3);
        assert_eq!(stats.non_zero()[0], (FailureKind::Dial, 2));
    }
}
