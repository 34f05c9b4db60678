//! Reverse DNS correlation for IP targets.
//!
//! Lookups are best-effort: a failure or timeout yields no hostname rather
//! than an error.

mod resolution;

// Re-export public API
pub use resolution::{reverse_dns_lookup, trim_root_label, ReverseResolver};
