//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, defaults, output naming)
//! - CLI option types and parsing
//! - Configuration validation

mod constants;
mod types;
mod validation;

// Re-export all constants
pub use constants::*;
pub use types::{Config, LogFormat, LogLevel, ScanTarget};
pub use validation::{parse_port, ConfigValidationError};
