//! tls_scrape library: concurrent TLS certificate scanning
//!
//! This library probes domains or IP ranges over TLS, captures the presented
//! certificate chain, validates it, and reports identity fields, revocation
//! endpoints, and (for IP targets) reverse DNS correlation.
//!
//! # Example
//!
//! ```no_run
//! use tls_scrape::{run_scan, Config};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     subnet: Some("192.0.2.0/28".to_string()),
//!     concurrency: 16,
//!     ..Default::default()
//! };
//!
//! let report = run_scan(config).await?;
//! println!("Scanned {} targets: {} succeeded, {} failed",
//!          report.total_targets, report.successful, report.failed);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

#![warn(missing_docs)]

pub mod address;
pub mod batch;
pub mod config;
pub mod dns;
pub mod error_handling;
pub mod initialization;
pub mod metrics;
pub mod models;
pub mod ocsp;
pub mod output;
mod run;
pub mod scan;
pub mod status_server;
pub mod tls;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel};
pub use run::{run_scan, ScanReport};
