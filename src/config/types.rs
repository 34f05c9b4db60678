//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration. Every flag can also be supplied through the upper-case
//! environment variable of the same name (or a `.env` file).

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::constants::{DEFAULT_CONCURRENCY, DEFAULT_CSV_HEADER, DEFAULT_PORT};
use crate::config::validation::parse_port;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// What a single invocation scans.
///
/// Exactly one source is selected per run; see [`Config::target`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanTarget {
    /// A single domain name
    Domain(String),
    /// Domains read from a named column of a CSV file
    CsvFile {
        /// CSV file path
        path: PathBuf,
        /// Column header holding the domains
        header: String,
    },
    /// A single IP literal
    Address(String),
    /// A CIDR subnet
    Subnet(String),
}

/// Scanner configuration.
///
/// Parsed from the command line by the binary, or constructed programmatically
/// by library users.
///
/// # Examples
///
/// ```no_run
/// use tls_scrape::Config;
///
/// let config = Config {
///     fqdn: Some("example.com".to_string()),
///     concurrency: 20,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tls_scrape",
    version,
    about = "Scans domains or IP ranges over TLS and reports certificate chain details"
)]
pub struct Config {
    /// Fully qualified domain name to scan
    #[arg(long, env = "FQDN")]
    pub fqdn: Option<String>,

    /// CSV file containing the domains to scan
    #[arg(long, env = "FILEPATH")]
    pub filepath: Option<PathBuf>,

    /// CSV column header holding the domains
    #[arg(long, env = "HEADER", default_value = DEFAULT_CSV_HEADER)]
    pub header: String,

    /// Directory for JSON output (no files are written when omitted)
    #[arg(long, env = "OUTDIR")]
    pub outdir: Option<PathBuf>,

    /// Maximum number of concurrent TLS probes
    #[arg(long, env = "CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Pretty-print JSON output
    #[arg(long, env = "PRETTYJSON")]
    pub prettyjson: bool,

    /// Write all results into a single bundled JSON file
    #[arg(long, env = "BUNDLE")]
    pub bundle: bool,

    /// Single IP address to scan
    #[arg(long, env = "IP")]
    pub ip: Option<String>,

    /// CIDR subnet to scan (e.g. 192.168.1.0/24)
    #[arg(long, env = "SUBNET")]
    pub subnet: Option<String>,

    /// TLS port to connect to
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT, value_parser = parse_port)]
    pub port: u16,

    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Serve Prometheus metrics on 127.0.0.1:<port>/metrics while scanning
    #[arg(long, env = "METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Check OCSP revocation status for each successfully scanned domain
    #[arg(long, env = "OCSP")]
    pub ocsp: bool,

    /// Validate against the bundled Mozilla root set instead of the platform store
    #[arg(long, env = "BUNDLED_ROOTS")]
    pub bundled_roots: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fqdn: None,
            filepath: None,
            header: DEFAULT_CSV_HEADER.to_string(),
            outdir: None,
            concurrency: DEFAULT_CONCURRENCY,
            prettyjson: false,
            bundle: false,
            ip: None,
            subnet: None,
            port: DEFAULT_PORT,
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            metrics_port: None,
            ocsp: false,
            bundled_roots: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Warn),
            log::LevelFilter::Warn
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Info),
            log::LevelFilter::Info
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Debug),
            log::LevelFilter::Debug
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.concurrency, 10);
        assert_eq!(config.port, 443);
        assert_eq!(config.header, "url");
        assert!(!config.bundle);
        assert!(!config.prettyjson);
        assert!(config.outdir.is_none());
        assert!(config.metrics_port.is_none());
    }

    #[test]
    fn test_parse_cli_flags() {
        let config = Config::try_parse_from([
            "tls_scrape",
            "--subnet",
            "10.0.0.0/30",
            "--port",
            "8443",
            "--concurrency",
            "4",
            "--bundle",
            "--outdir",
            "out",
        ])
        .unwrap();

        assert_eq!(config.subnet.as_deref(), Some("10.0.0.0/30"));
        assert_eq!(config.port, 8443);
        assert_eq!(config.concurrency, 4);
        assert!(config.bundle);
        assert_eq!(config.outdir, Some(PathBuf::from("out")));
    }

    #[test]
    fn test_parse_cli_rejects_bad_port() {
        let result = Config::try_parse_from(["tls_scrape", "--ip", "1.1.1.1", "--port", "70000"]);
        assert!(result.is_err());

        let result = Config::try_parse_from(["tls_scrape", "--ip", "1.1.1.1", "--port", "https"]);
        assert!(result.is_err());
    }
}
