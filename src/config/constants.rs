//! Configuration constants.
//!
//! This module defines the constants used throughout the scanner, including
//! timeouts, defaults for CLI options, and output naming.

// Defaults for CLI options
/// Default number of concurrent probes (also the batch size)
pub const DEFAULT_CONCURRENCY: usize = 10;
/// Default TLS port
pub const DEFAULT_PORT: u16 = 443;
/// Default CSV column holding the targets
pub const DEFAULT_CSV_HEADER: &str = "url";

// Network operation timeouts
/// DNS query timeout in seconds (per resolver attempt)
pub const DNS_TIMEOUT_SECS: u64 = 3;
/// Upper bound for a whole reverse DNS lookup in seconds
pub const REVERSE_DNS_TIMEOUT_SECS: u64 = 5;
/// TCP connection timeout in seconds
pub const TCP_CONNECT_TIMEOUT_SECS: u64 = 5;
/// TLS handshake timeout in seconds
pub const TLS_HANDSHAKE_TIMEOUT_SECS: u64 = 5;
/// OCSP responder request timeout in seconds
pub const OCSP_TIMEOUT_SECS: u64 = 10;

// Output naming
/// Prefix of the bundled JSON output file
pub const BUNDLE_FILE_PREFIX: &str = "tls-scrape-bundle-";
/// Timestamp layout appended to the bundle prefix
pub const BUNDLE_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";
/// Prefix of every structured record log line
pub const LOG_LINE_PREFIX: &str = "tls-scrape";
