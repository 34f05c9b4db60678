//! Input and output shims around the scan engine.
//!
//! - CSV target lists
//! - Per-record and bundled JSON files
//! - One-line log summaries

mod csv;
mod json;
mod log_line;

pub use csv::read_targets_from_csv;
pub use json::{write_bundled_json, write_json, JsonRecord};
pub use log_line::{log_records, LogLine};
