//! Batch processing for domain lists and address ranges.
//!
//! Each batch goes through the scanner; its records are logged, optionally
//! checked against OCSP, and written out before the next batch starts.

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::atomic::Ordering;

use anyhow::Result;
use futures::future::join_all;
use log::{debug, error, info, warn, Level};

use crate::address::AddressRange;
use crate::batch::chunk;
use crate::config::Config;
use crate::error_handling::{MultiTargetError, ScanError};
use crate::models::CertificateRecord;
use crate::ocsp::check_ocsp_status;
use crate::output::{log_records, write_bundled_json, write_json, JsonRecord, LogLine};

use super::init::ScanResources;

/// What a run produced once every batch is done.
pub(super) struct RunOutcome {
    pub successful: usize,
    pub failures: MultiTargetError,
    pub bundle_path: Option<PathBuf>,
}

/// Scans a list of domains in batches of `concurrency`.
pub(super) async fn scan_domain_list(
    resources: &ScanResources,
    domains: Vec<String>,
) -> Result<RunOutcome> {
    resources
        .total_targets
        .store(domains.len(), Ordering::SeqCst);
    info!(
        "Scanning {} domain(s) on port {}",
        domains.len(),
        resources.config.port
    );

    let mut sink = RecordSink::new(&resources.config);
    let mut failures = MultiTargetError::new();

    for batch in chunk(&domains, resources.config.concurrency) {
        let outcome = resources.scanner.scan_domains(&batch).await;
        log_failures("domain", &outcome.failures);
        if let Some(client) = &resources.http_client {
            check_revocation(client, &outcome.records).await;
        }
        sink.emit(outcome.records).await;
        failures.merge(outcome.failures);
    }

    Ok(sink.finish(failures).await)
}

/// Scans every address in `range`, enumerating lazily.
pub(super) async fn scan_address_range(
    resources: &ScanResources,
    range: &AddressRange,
) -> Result<RunOutcome> {
    let total = usize::try_from(range.len()).unwrap_or(usize::MAX);
    resources.total_targets.store(total, Ordering::SeqCst);
    info!(
        "Scanning {} IP address(es) on port {}",
        range.len(),
        resources.config.port
    );

    let mut sink = RecordSink::new(&resources.config);
    let mut failures = MultiTargetError::new();
    let mut addresses = range.iter();

    loop {
        let batch: Vec<IpAddr> = addresses
            .by_ref()
            .take(resources.config.concurrency)
            .collect();
        if batch.is_empty() {
            break;
        }
        let outcome = resources.scanner.scan_addresses(&batch).await;
        log_failures("IP", &outcome.failures);
        sink.emit(outcome.records).await;
        failures.merge(outcome.failures);
    }

    Ok(sink.finish(failures).await)
}

/// Unreachable targets are expected during sweeps; anything else is an error.
fn failure_level(error: &ScanError) -> Level {
    if error.is_connection_error() {
        Level::Warn
    } else {
        Level::Error
    }
}

fn log_failures(kind: &str, failures: &MultiTargetError) {
    for (target, error) in failures.iter() {
        match failure_level(error) {
            Level::Warn => warn!(
                "Skipping {kind} {target}: Connection failed ({kind} may be unreachable or not running a TLS service)"
            ),
            _ => error!("Skipping {kind} {target}: {error}"),
        }
    }
}

async fn check_revocation(client: &reqwest::Client, records: &[CertificateRecord]) {
    let checks = records.iter().filter_map(|record| {
        match (record.leaf_der(), record.issuer_der()) {
            (Some(leaf), Some(issuer)) => Some(async move {
                (record, check_ocsp_status(leaf, issuer, client).await)
            }),
            _ => {
                debug!(
                    "Skipping OCSP check for {}: chain has no issuer certificate",
                    record.domain
                );
                None
            }
        }
    });

    for (record, result) in join_all(checks).await {
        match result {
            Ok(status) => info!("OCSP status for {}: {status}", record.domain),
            Err(e) => warn!("OCSP check failed for {}: {e}", record.domain),
        }
    }
}

/// Destination for successful records: log lines plus JSON files.
struct RecordSink<R> {
    outdir: Option<PathBuf>,
    pretty: bool,
    bundle: bool,
    bundled: Vec<R>,
    successful: usize,
}

impl<R: JsonRecord + LogLine> RecordSink<R> {
    fn new(config: &Config) -> Self {
        Self {
            outdir: config.outdir.clone(),
            pretty: config.prettyjson,
            bundle: config.bundle,
            bundled: Vec::new(),
            successful: 0,
        }
    }

    async fn emit(&mut self, records: Vec<R>) {
        log_records(&records);
        self.successful += records.len();

        let Some(dir) = &self.outdir else {
            return;
        };
        if self.bundle {
            self.bundled.extend(records);
            return;
        }
        for record in &records {
            if let Err(e) = write_json(dir, record, self.pretty).await {
                warn!("Error writing JSON for {}: {e:#}", record.file_stem());
            }
        }
    }

    async fn finish(self, failures: MultiTargetError) -> RunOutcome {
        let bundle_path = match (&self.outdir, self.bundle) {
            (Some(dir), true) => write_bundled_json(dir, &self.bundled, self.pretty)
                .await
                .unwrap_or_else(|e| {
                    warn!("Error writing bundled JSON: {e:#}");
                    None
                }),
            _ => None,
        };
        RunOutcome {
            successful: self.successful,
            failures,
            bundle_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handling::ScanError;
    use crate::models::fixtures::{address_record, record};

    fn config(outdir: Option<PathBuf>, bundle: bool) -> Config {
        Config {
            outdir,
            bundle,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_sink_without_outdir_only_counts() {
        let mut sink = RecordSink::new(&config(None, false));
        sink.emit(vec![record("a.example"), record("b.example")]).await;
        let outcome = sink.finish(MultiTargetError::new()).await;
        assert_eq!(outcome.successful, 2);
        assert!(outcome.bundle_path.is_none());
    }

    #[tokio::test]
    async fn test_sink_writes_per_record_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = RecordSink::new(&config(Some(dir.path().to_path_buf()), false));
        sink.emit(vec![address_record("192.0.2.1", None)]).await;
        sink.emit(vec![address_record("192.0.2.2", None)]).await;
        let outcome = sink.finish(MultiTargetError::new()).await;

        assert_eq!(outcome.successful, 2);
        assert!(dir.path().join("192.0.2.1.json").exists());
        assert!(dir.path().join("192.0.2.2.json").exists());
        assert!(outcome.bundle_path.is_none());
    }

    #[tokio::test]
    async fn test_sink_bundles_across_batches() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = RecordSink::new(&config(Some(dir.path().to_path_buf()), true));
        sink.emit(vec![record("a.example")]).await;
        sink.emit(vec![record("b.example")]).await;

        let mut failures = MultiTargetError::new();
        failures.insert("c.example", ScanError::NoCertificates("c.example:443".into()));
        let outcome = sink.finish(failures).await;

        let bundle = outcome.bundle_path.unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(bundle).unwrap()).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
        assert!(!dir.path().join("a.example.json").exists());
        assert_eq!(outcome.failures.len(), 1);
    }

    #[test]
    fn test_failure_level_by_class() {
        let dial = ScanError::DialFailure {
            target: "192.0.2.1:443".into(),
            reason: "connection refused".into(),
        };
        let timeout = ScanError::DialTimeout {
            target: "192.0.2.1:443".into(),
            secs: 5,
        };
        assert_eq!(failure_level(&dial), Level::Warn);
        assert_eq!(failure_level(&timeout), Level::Warn);

        assert_eq!(
            failure_level(&ScanError::NoCertificates("a.example:443".into())),
            Level::Error
        );
        assert_eq!(
            failure_level(&ScanError::InvalidServerName("bad name".into())),
            Level::Error
        );
    }

    #[tokio::test]
    async fn test_empty_bundle_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let sink: RecordSink<CertificateRecord> =
            RecordSink::new(&config(Some(dir.path().to_path_buf()), true));
        let outcome = sink.finish(MultiTargetError::new()).await;
        assert!(outcome.bundle_path.is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
