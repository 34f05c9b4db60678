//! Unreachable targets are aggregated, never fatal.

mod helpers;

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use rustls::RootCertStore;
use tls_scrape::address::parse_ip_or_subnet;
use tls_scrape::metrics::ScanMetrics;
use tls_scrape::scan::Scanner;
use tls_scrape::tls::TlsProber;

#[tokio::test]
async fn test_three_unreachable_addresses_with_concurrency_two() {
    let port = helpers::closed_port().await;
    let range = parse_ip_or_subnet("127.0.0.1").unwrap();
    assert_eq!(range.len(), 1);

    // Loopback aliases are all refused on an unused port
    let ips: Vec<IpAddr> = ["127.0.0.1", "127.0.0.2", "127.0.0.3"]
        .iter()
        .map(|s| s.parse().unwrap())
        .collect();

    let prober = TlsProber::new(RootCertStore::empty(), None)
        .unwrap()
        .with_timeouts(Duration::from_secs(1), Duration::from_secs(1));
    let scanner = Scanner::new(Arc::new(prober), Arc::new(ScanMetrics::new()), 2, port);

    let outcome = scanner.scan_addresses(&ips).await;
    assert!(outcome.records.is_empty());
    assert_eq!(outcome.failures.len(), 3);

    let (records, result) = outcome.into_result();
    assert!(records.is_empty());
    let err = result.unwrap_err();
    assert_eq!(err.connection_failures().count(), 3);

    let rendered = err.to_string();
    assert!(rendered.starts_with("Multiple errors occurred:\n"));
    for ip in ["127.0.0.1", "127.0.0.2", "127.0.0.3"] {
        assert!(rendered.contains(&format!("{ip} -> dial tcp {ip}:{port}")));
    }
}
