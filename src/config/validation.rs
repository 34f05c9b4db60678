//! Configuration validation.

use std::fmt;

use super::constants::DEFAULT_PORT;
use super::types::{Config, ScanTarget};

/// A configuration problem, naming the offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    /// Name of the field (or field group) that failed validation
    pub field: &'static str,
    /// Human-readable explanation
    pub message: String,
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigValidationError {}

const TARGET_FIELDS: &str = "fqdn, filepath, ip, or subnet";

/// Parses a port string.
///
/// An empty string selects the default TLS port (443).
///
/// # Errors
///
/// Returns `"invalid port number"` when the value is not an integer and
/// `"port number out of range"` when it falls outside 1..=65535.
pub fn parse_port(value: &str) -> Result<u16, String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(DEFAULT_PORT);
    }

    let port: i64 = value
        .parse()
        .map_err(|_| "invalid port number".to_string())?;
    if !(1..=65535).contains(&port) {
        return Err("port number out of range".to_string());
    }
    u16::try_from(port).map_err(|_| "port number out of range".to_string())
}

impl Config {
    /// Resolves which input source this run scans.
    ///
    /// # Errors
    ///
    /// Returns a validation error when zero or more than one of
    /// `fqdn`, `filepath`, `ip` and `subnet` is set.
    pub fn target(&self) -> Result<ScanTarget, ConfigValidationError> {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());

        let mut selected = Vec::new();
        if present(&self.fqdn) {
            selected.push("fqdn");
        }
        if self.filepath.is_some() {
            selected.push("filepath");
        }
        if present(&self.ip) {
            selected.push("ip");
        }
        if present(&self.subnet) {
            selected.push("subnet");
        }

        if selected.len() > 1 {
            return Err(ConfigValidationError {
                field: "target",
                message: format!("You can only specify one of: {TARGET_FIELDS}."),
            });
        }

        match selected.first().copied() {
            Some("fqdn") => Ok(ScanTarget::Domain(
                self.fqdn.clone().unwrap_or_default().trim().to_string(),
            )),
            Some("filepath") => Ok(ScanTarget::CsvFile {
                path: self.filepath.clone().unwrap_or_default(),
                header: self.header.clone(),
            }),
            Some("ip") => Ok(ScanTarget::Address(
                self.ip.clone().unwrap_or_default().trim().to_string(),
            )),
            Some(_) => Ok(ScanTarget::Subnet(
                self.subnet.clone().unwrap_or_default().trim().to_string(),
            )),
            None => Err(ConfigValidationError {
                field: "target",
                message: format!("You must specify one of: {TARGET_FIELDS}."),
            }),
        }
    }

    /// Validates the configuration as a whole.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.target()?;

        if self.concurrency == 0 {
            return Err(ConfigValidationError {
                field: "concurrency",
                message: "concurrency must be greater than 0".to_string(),
            });
        }

        if self.bundle && self.outdir.is_none() {
            return Err(ConfigValidationError {
                field: "bundle",
                message: "--bundle requires --outdir to be set".to_string(),
            });
        }

        if self.header.trim().is_empty() {
            return Err(ConfigValidationError {
                field: "header",
                message: "CSV header must not be empty".to_string(),
            });
        }

        Ok(())
    }
}
