//! Error type definitions.
//!
//! This module defines the error types used throughout the scanner and the
//! failure kinds tracked for end-of-run statistics.

use log::SetLoggerError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

use crate::ocsp::OcspStatus;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error building the HTTP client used for OCSP requests.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] reqwest::Error),
}

/// Per-target scan failures.
///
/// Invalid certificates are not errors: they are reported on the returned
/// record. These variants cover probes that produced no record at all, plus
/// malformed input that is rejected before any probe starts.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Input is not an IP literal.
    #[error("invalid IP address: {0}")]
    InvalidAddress(String),

    /// Input is not a valid CIDR subnet.
    #[error("invalid subnet {subnet}: {reason}")]
    InvalidSubnet {
        /// The offending input
        subnet: String,
        /// Parser message
        reason: String,
    },

    /// The target cannot be used as a TLS server name.
    #[error("invalid server name: {0}")]
    InvalidServerName(String),

    /// The TCP connection could not be established.
    #[error("dial tcp {target}: {reason}")]
    DialFailure {
        /// `host:port` that was dialed
        target: String,
        /// Underlying I/O error text
        reason: String,
    },

    /// The TCP connection did not complete in time.
    #[error("dial tcp {target}: i/o timeout after {secs}s")]
    DialTimeout {
        /// `host:port` that was dialed
        target: String,
        /// Timeout that elapsed
        secs: u64,
    },

    /// The TLS handshake failed.
    #[error("TLS handshake failed for {target}: {reason}")]
    Handshake {
        /// `host:port` of the peer
        target: String,
        /// rustls error text
        reason: String,
    },

    /// The TLS handshake did not complete in time.
    #[error("TLS handshake timeout for {target} ({secs}s)")]
    HandshakeTimeout {
        /// `host:port` of the peer
        target: String,
        /// Timeout that elapsed
        secs: u64,
    },

    /// Handshake succeeded but the peer presented no certificates.
    #[error("no certificates found for {0}")]
    NoCertificates(String),

    /// A presented certificate could not be parsed.
    #[error("failed to parse certificate: {0}")]
    CertificateParse(String),

    /// The probe task panicked or was cancelled.
    #[error("probe task failed: {0}")]
    TaskFailed(String),
}

impl ScanError {
    /// Returns the statistics bucket for this failure.
    pub fn kind(&self) -> FailureKind {
        match self {
            ScanError::InvalidAddress(_)
            | ScanError::InvalidSubnet { .. }
            | ScanError::InvalidServerName(_) => FailureKind::InvalidTarget,
            ScanError::DialFailure { .. } => FailureKind::Dial,
            ScanError::DialTimeout { .. } | ScanError::HandshakeTimeout { .. } => {
                FailureKind::Timeout
            }
            ScanError::Handshake { .. } => FailureKind::Handshake,
            ScanError::NoCertificates(_) => FailureKind::NoCertificates,
            ScanError::CertificateParse(_) => FailureKind::CertificateParse,
            ScanError::TaskFailed(_) => FailureKind::Task,
        }
    }

    /// True when the target could not be reached at all.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            ScanError::DialFailure { .. } | ScanError::DialTimeout { .. }
        )
    }
}

/// Errors from the OCSP status check.
#[derive(Error, Debug)]
pub enum OcspError {
    /// The leaf certificate advertises no OCSP responder.
    #[error("no OCSP server specified in cert")]
    NoOcspServer,

    /// The responder answered, but the certificate is not good.
    #[error("invalid OCSP status: {0}")]
    InvalidStatus(OcspStatus),

    /// The HTTP exchange with the responder failed.
    #[error("OCSP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The responder returned a non-successful response status.
    #[error("OCSP responder returned status {0}")]
    ResponderStatus(u8),

    /// The response could not be decoded.
    #[error("malformed OCSP response: {0}")]
    Malformed(String),

    /// The response signature did not verify.
    #[error("OCSP signature verification failed: {0}")]
    Signature(String),

    /// The leaf, issuer, or embedded responder certificate could not be parsed.
    #[error("failed to parse certificate: {0}")]
    CertificateParse(String),
}

impl From<der::Error> for OcspError {
    fn from(e: der::Error) -> Self {
        OcspError::Malformed(e.to_string())
    }
}

/// Failure buckets counted during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum FailureKind {
    /// Connection refused, unreachable, etc.
    Dial,
    /// Connect or handshake timeout
    Timeout,
    /// TLS protocol failure
    Handshake,
    /// Empty certificate chain
    NoCertificates,
    /// Unparseable certificate
    CertificateParse,
    /// Malformed target
    InvalidTarget,
    /// Panicked or cancelled task
    Task,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FailureKind {
    /// Returns a human-readable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Dial => "Connection failed",
            FailureKind::Timeout => "Connection timeout",
            FailureKind::Handshake => "TLS handshake error",
            FailureKind::NoCertificates => "No certificates presented",
            FailureKind::CertificateParse => "Certificate parse error",
            FailureKind::InvalidTarget => "Invalid target",
            FailureKind::Task => "Task failure",
        }
    }
}
