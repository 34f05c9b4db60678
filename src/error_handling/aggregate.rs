//! Multi-target error aggregation.
//!
//! A scan run collects one failure per target that produced no record. The
//! collected failures travel back to the caller as a single error value.

use std::collections::BTreeMap;
use std::fmt;

use super::types::ScanError;

/// Returns true when an error message describes a dial or connect failure.
///
/// Connection-class failures mean the target was unreachable or not serving
/// TLS, as opposed to a protocol or certificate problem.
pub fn is_connection_error(message: &str) -> bool {
    message.contains("dial tcp") || message.contains("connect:")
}

/// Failures keyed by target identifier (domain or IP literal).
///
/// Every key had a probe attempt that yielded no record. Inserting an
/// identifier twice keeps the later failure.
#[derive(Debug, Default)]
pub struct MultiTargetError {
    errors: BTreeMap<String, ScanError>,
}

impl MultiTargetError {
    /// Creates an empty aggregate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the failure for `target`, replacing any earlier one.
    pub fn insert(&mut self, target: impl Into<String>, error: ScanError) {
        self.errors.insert(target.into(), error);
    }

    /// Folds another aggregate into this one by key union.
    pub fn merge(&mut self, other: MultiTargetError) {
        self.errors.extend(other.errors);
    }

    /// Number of failed targets.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// True when no target failed.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Looks up the failure recorded for `target`.
    pub fn get(&self, target: &str) -> Option<&ScanError> {
        self.errors.get(target)
    }

    /// Iterates over `(target, failure)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScanError)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates over the targets whose failure is connection-class.
    pub fn connection_failures(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(|(_, e)| e.is_connection_error() || is_connection_error(&e.to_string()))
            .map(|(k, _)| k)
    }

    /// Converts an aggregate into `Err` when it holds anything.
    pub fn into_result(self) -> Result<(), MultiTargetError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl IntoIterator for MultiTargetError {
    type Item = (String, ScanError);
    type IntoIter = std::collections::btree_map::IntoIter<String, ScanError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl fmt::Display for MultiTargetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Multiple errors occurred:")?;
        for (target, error) in &self.errors {
            writeln!(f, "{target} -> {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for MultiTargetError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn dial(target: &str) -> ScanError {
        ScanError::DialFailure {
            target: format!("{target}:443"),
            reason: "connection refused".to_string(),
        }
    }

    #[test]
    fn test_display_lists_every_entry() {
        let mut errors = MultiTargetError::new();
        errors.insert("a.example", dial("a.example"));
        errors.insert(
            "b.example",
            ScanError::NoCertificates("b.example:443".to_string()),
        );

        let rendered = errors.to_string();
        assert!(rendered.starts_with("Multiple errors occurred:\n"));
        assert!(rendered.contains("a.example -> dial tcp a.example:443: connection refused\n"));
        assert!(rendered.contains("b.example -> no certificates found for b.example:443\n"));
        assert_eq!(rendered.lines().count(), 3);
    }

    #[test]
    fn test_merge_is_key_union_with_later_wins() {
        let mut first = MultiTargetError::new();
        first.insert("a", dial("a"));
        first.insert("b", dial("b"));

        let mut second = MultiTargetError::new();
        second.insert("b", ScanError::NoCertificates("b:443".to_string()));
        second.insert("c", dial("c"));

        first.merge(second);
        assert_eq!(first.len(), 3);
        assert!(matches!(
            first.get("b"),
            Some(ScanError::NoCertificates(_))
        ));
    }

    #[test]
    fn test_is_connection_error_by_message() {
        assert!(is_connection_error("dial tcp 1.2.3.4:443: connection refused"));
        assert!(is_connection_error("connect: no route to host"));
        assert!(!is_connection_error("x509: certificate signed by unknown authority"));
    }

    #[test]
    fn test_connection_failures_filters_protocol_errors() {
        let mut errors = MultiTargetError::new();
        errors.insert("down", dial("down"));
        errors.insert("odd", ScanError::NoCertificates("odd:443".to_string()));

        let unreachable: Vec<_> = errors.connection_failures().collect();
        assert_eq!(unreachable, vec!["down"]);
    }

    #[test]
    fn test_into_result() {
        assert!(MultiTargetError::new().into_result().is_ok());

        let mut errors = MultiTargetError::new();
        errors.insert("x", dial("x"));
        assert!(errors.into_result().is_err());
    }
}
