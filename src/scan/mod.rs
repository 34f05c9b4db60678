//! Concurrent scan orchestration.
//!
//! A [`Scanner`] fans one batch of targets out to a bounded number of
//! concurrent probes and waits for every probe to finish. Failures never
//! cancel other probes; they are gathered into a [`MultiTargetError`]
//! returned next to the records that did succeed.
//!
//! The scanner keeps no state between batches. Callers partition target
//! lists (see [`crate::batch::chunk`]) and merge the per-batch outcomes.

use std::future::Future;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use log::{debug, warn};

use crate::error_handling::{MultiTargetError, ScanError};
use crate::initialization::init_semaphore;
use crate::metrics::{ScanMetrics, ScrapeStatus};
use crate::models::{AddressCertificateRecord, CertificateRecord};
use crate::tls::Probe;

/// Records and failures from one or more batches.
#[derive(Debug)]
pub struct BatchOutcome<R> {
    /// Successful records, in completion order
    pub records: Vec<R>,
    /// Targets that produced no record
    pub failures: MultiTargetError,
}

impl<R> Default for BatchOutcome<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            failures: MultiTargetError::new(),
        }
    }
}

impl<R> BatchOutcome<R> {
    /// Appends another outcome's records and unions its failures.
    pub fn merge(&mut self, other: BatchOutcome<R>) {
        self.records.extend(other.records);
        self.failures.merge(other.failures);
    }

    /// Splits into the records and `Err` when any target failed.
    pub fn into_result(self) -> (Vec<R>, Result<(), MultiTargetError>) {
        (self.records, self.failures.into_result())
    }
}

/// Bounded-concurrency dispatcher over a [`Probe`].
pub struct Scanner<P: Probe> {
    probe: Arc<P>,
    metrics: Arc<ScanMetrics>,
    concurrency: usize,
    port: u16,
}

impl<P: Probe> Scanner<P> {
    /// Creates a scanner running at most `concurrency` probes at once
    /// (a limit of 0 is raised to 1).
    pub fn new(probe: Arc<P>, metrics: Arc<ScanMetrics>, concurrency: usize, port: u16) -> Self {
        Self {
            probe,
            metrics,
            concurrency: concurrency.max(1),
            port,
        }
    }

    /// Metrics sink shared with the probes.
    pub fn metrics(&self) -> &Arc<ScanMetrics> {
        &self.metrics
    }

    /// Scans one batch of domains.
    pub async fn scan_domains(&self, domains: &[String]) -> BatchOutcome<CertificateRecord> {
        let port = self.port;
        self.dispatch(domains.to_vec(), move |probe, domain: String| async move {
            probe.probe_domain(&domain, port).await
        })
        .await
    }

    /// Scans one batch of IP addresses.
    pub async fn scan_addresses(&self, ips: &[IpAddr]) -> BatchOutcome<AddressCertificateRecord> {
        let port = self.port;
        self.dispatch(ips.to_vec(), move |probe, ip: IpAddr| async move {
            probe.probe_address(ip, port).await
        })
        .await
    }

    async fn dispatch<T, R, F, Fut>(&self, targets: Vec<T>, probe_one: F) -> BatchOutcome<R>
    where
        T: ToString,
        R: Send + 'static,
        F: Fn(Arc<P>, T) -> Fut,
        Fut: Future<Output = Result<R, ScanError>> + Send + 'static,
    {
        let semaphore = init_semaphore(self.concurrency);
        let mut tasks = FuturesUnordered::new();

        for target in targets {
            let id = target.to_string();
            let task_id = id.clone();
            let semaphore = Arc::clone(&semaphore);
            let metrics = Arc::clone(&self.metrics);
            let probe = probe_one(Arc::clone(&self.probe), target);

            let handle = tokio::spawn(async move {
                // Hold the permit until the probe completes
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| ScanError::TaskFailed(e.to_string()))?;

                let start = Instant::now();
                let result = probe.await;
                metrics.observe_duration(&task_id, start.elapsed());
                metrics.record(if result.is_ok() {
                    ScrapeStatus::Success
                } else {
                    ScrapeStatus::Failed
                });
                result
            });
            tasks.push(async move { (id, handle.await) });
        }

        let mut outcome = BatchOutcome::default();
        while let Some((id, joined)) = tasks.next().await {
            match joined {
                Ok(Ok(record)) => outcome.records.push(record),
                Ok(Err(e)) => {
                    debug!("Probe failed for {id}: {e}");
                    outcome.failures.insert(id, e);
                }
                Err(join_error) => {
                    warn!("Probe task for {id} panicked: {join_error:?}");
                    outcome
                        .failures
                        .insert(id, ScanError::TaskFailed(join_error.to_string()));
                }
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChainCertificate;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Probe double: fails for listed targets, tracks in-flight peaks.
    #[derive(Default)]
    struct FakeProbe {
        unreachable: HashSet<String>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl FakeProbe {
        fn unreachable(targets: &[&str]) -> Self {
            Self {
                unreachable: targets.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }
        }

        async fn run(&self, target: String, port: u16) -> Result<CertificateRecord, ScanError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if target == "panic.example" {
                panic!("probe blew up");
            }
            if self.unreachable.contains(&target) {
                return Err(ScanError::DialFailure {
                    target: format!("{target}:{port}"),
                    reason: "connect: connection refused".to_string(),
                });
            }
            Ok(CertificateRecord {
                domain: target.clone(),
                serial: "1".to_string(),
                not_before: String::new(),
                not_after: String::new(),
                issuer: String::new(),
                crl: Vec::new(),
                ocsp_server: Vec::new(),
                cert_chain: vec![ChainCertificate {
                    subject: target,
                    issuer: String::new(),
                    serial: "1".to_string(),
                    not_before: String::new(),
                    not_after: String::new(),
                    der: Vec::new(),
                }],
                valid: true,
                validation_errors: Vec::new(),
            })
        }
    }

    impl Probe for FakeProbe {
        async fn probe_domain(
            &self,
            domain: &str,
            port: u16,
        ) -> Result<CertificateRecord, ScanError> {
            self.run(domain.to_string(), port).await
        }

        async fn probe_address(
            &self,
            ip: IpAddr,
            port: u16,
        ) -> Result<AddressCertificateRecord, ScanError> {
            let certificate = self.run(ip.to_string(), port).await?;
            Ok(AddressCertificateRecord {
                certificate,
                ip: ip.to_string(),
                hostname: None,
                hostname_in_cert: false,
                sans: Vec::new(),
            })
        }
    }

    fn domains(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let scanner = Scanner::new(
            Arc::new(FakeProbe::default()),
            Arc::new(ScanMetrics::new()),
            4,
            443,
        );
        let outcome = scanner.scan_domains(&[]).await;
        assert!(outcome.records.is_empty());
        assert!(outcome.failures.is_empty());
        let (_, result) = outcome.into_result();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let probe = Arc::new(FakeProbe::default());
        let scanner = Scanner::new(Arc::clone(&probe), Arc::new(ScanMetrics::new()), 3, 443);
        let targets: Vec<String> = (0..12).map(|i| format!("host{i}.example")).collect();

        let outcome = scanner.scan_domains(&targets).await;
        assert_eq!(outcome.records.len(), 12);
        assert!(probe.peak.load(Ordering::SeqCst) <= 3);
        assert!(probe.peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_partial_failure_returns_both() {
        let probe = Arc::new(FakeProbe::unreachable(&["down.example"]));
        let metrics = Arc::new(ScanMetrics::new());
        let scanner = Scanner::new(probe, Arc::clone(&metrics), 2, 443);

        let outcome = scanner
            .scan_domains(&domains(&["a.example", "down.example", "b.example"]))
            .await;

        let mut names: Vec<_> = outcome.records.iter().map(|r| r.domain.clone()).collect();
        names.sort();
        assert_eq!(names, vec!["a.example", "b.example"]);
        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.failures.get("down.example").is_some());

        assert_eq!(metrics.scrapes(ScrapeStatus::Success), 2);
        assert_eq!(metrics.scrapes(ScrapeStatus::Failed), 1);
        assert_eq!(metrics.duration_summary("down.example").unwrap().0, 1);

        let (records, result) = outcome.into_result();
        assert_eq!(records.len(), 2);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_all_unreachable_are_connection_class() {
        let probe = Arc::new(FakeProbe::unreachable(&["x", "y", "z"]));
        let scanner = Scanner::new(probe, Arc::new(ScanMetrics::new()), 2, 443);

        let outcome = scanner.scan_domains(&domains(&["x", "y", "z"])).await;
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.failures.len(), 3);
        assert_eq!(outcome.failures.connection_failures().count(), 3);
    }

    #[tokio::test]
    async fn test_panicking_task_is_reported() {
        let scanner = Scanner::new(
            Arc::new(FakeProbe::default()),
            Arc::new(ScanMetrics::new()),
            2,
            443,
        );
        let outcome = scanner
            .scan_domains(&domains(&["ok.example", "panic.example"]))
            .await;

        assert_eq!(outcome.records.len(), 1);
        assert!(matches!(
            outcome.failures.get("panic.example"),
            Some(ScanError::TaskFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_scan_addresses_keys_by_ip_literal() {
        let probe = Arc::new(FakeProbe::unreachable(&["192.0.2.2"]));
        let scanner = Scanner::new(probe, Arc::new(ScanMetrics::new()), 2, 8443);
        let ips: Vec<IpAddr> = vec!["192.0.2.1".parse().unwrap(), "192.0.2.2".parse().unwrap()];

        let outcome = scanner.scan_addresses(&ips).await;
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].ip, "192.0.2.1");
        let err = outcome.failures.get("192.0.2.2").unwrap();
        assert!(err.to_string().contains("192.0.2.2:8443"));
    }

    #[tokio::test]
    async fn test_merge_outcomes_across_batches() {
        let probe = Arc::new(FakeProbe::unreachable(&["b2"]));
        let scanner = Scanner::new(probe, Arc::new(ScanMetrics::new()), 1, 443);

        let mut total = BatchOutcome::default();
        for batch in crate::batch::chunk(&domains(&["a1", "a2", "b1", "b2", "c1"]), 2) {
            total.merge(scanner.scan_domains(&batch).await);
        }
        assert_eq!(total.records.len(), 4);
        assert_eq!(total.failures.len(), 1);
    }
}
