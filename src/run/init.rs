//! Scan resource initialization.
//!
//! This module contains the `init_scan_resources` function which handles
//! all setup before the first batch is dispatched.

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use log::{info, warn};
use tokio::task::JoinHandle;

use crate::config::{Config, ScanTarget};
use crate::dns::ReverseResolver;
use crate::initialization::{init_client, init_crypto_provider, init_resolver, init_root_store};
use crate::metrics::ScanMetrics;
use crate::scan::Scanner;
use crate::status_server::{start_status_server, StatusState};
use crate::tls::TlsProber;

/// Shared resources for one run.
pub(super) struct ScanResources {
    pub config: Config,
    pub scanner: Scanner<TlsProber>,
    /// Present only when OCSP checks are enabled
    pub http_client: Option<Arc<reqwest::Client>>,
    /// Target count reported by the status server
    pub total_targets: Arc<AtomicUsize>,
    pub status_server: Option<JoinHandle<()>>,
    pub start_time: Instant,
}

/// Initialize all resources needed for a scan.
///
/// This function performs the following initialization steps:
/// 1. Validate the configuration
/// 2. Install the crypto provider and load the root store
/// 3. Build the TLS prober (with a reverse DNS resolver for IP targets)
/// 4. Create the metrics sink and scanner
/// 5. Build the OCSP HTTP client when requested
/// 6. Start the status server when a metrics port is set
///
/// # Errors
///
/// Returns an error if validation fails or a client cannot be built.
pub(super) async fn init_scan_resources(config: Config) -> Result<ScanResources> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration validation failed: {}", e))?;

    init_crypto_provider();
    let roots = init_root_store(config.bundled_roots);

    let needs_resolver = matches!(
        config.target()?,
        ScanTarget::Address(_) | ScanTarget::Subnet(_)
    );
    let resolver = needs_resolver.then(|| init_resolver() as Arc<dyn ReverseResolver>);
    let prober = TlsProber::new(roots, resolver).context("Failed to build TLS client")?;

    let metrics = Arc::new(ScanMetrics::new());
    let scanner = Scanner::new(
        Arc::new(prober),
        Arc::clone(&metrics),
        config.concurrency,
        config.port,
    );

    let http_client = if config.ocsp {
        Some(init_client().context("Failed to initialize OCSP HTTP client")?)
    } else {
        None
    };

    let state = StatusState::new(metrics);
    let total_targets = Arc::clone(&state.total_targets);
    let status_server = config.metrics_port.map(|port| {
        tokio::spawn(async move {
            if let Err(e) = start_status_server(port, state).await {
                warn!("Status server stopped: {e:#}");
            }
        })
    });

    info!(
        "Starting scan with concurrency {} on port {}",
        config.concurrency, config.port
    );

    Ok(ScanResources {
        config,
        scanner,
        http_client,
        total_targets,
        status_server,
        start_time: Instant::now(),
    })
}
