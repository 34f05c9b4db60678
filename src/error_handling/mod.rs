//! Error handling and failure statistics.
//!
//! This module provides:
//! - Error type definitions for scanning, OCSP, and initialization
//! - The multi-target error aggregate returned by scan runs
//! - Failure statistics tracking by kind
//!
//! Certificate validation problems are not errors here; they are reported on
//! the returned records. Errors mean a target produced no record at all.

mod aggregate;
mod stats;
mod types;

// Re-export public API
pub use aggregate::{is_connection_error, MultiTargetError};
pub use stats::FailureStats;
pub use types::{FailureKind, InitializationError, OcspError, ScanError};
