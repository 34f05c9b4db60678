//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `tls_scrape` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use tls_scrape::initialization::{init_crypto_provider, init_logger_with};
use tls_scrape::{run_scan, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    // Try the current directory first, then the executable's directory
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    // Parse command-line arguments into Config
    let config = Config::parse();

    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    // Initialize crypto provider for TLS operations
    init_crypto_provider();

    match run_scan(config).await {
        Ok(report) => {
            println!(
                "✅ Scanned {} target{} ({} succeeded, {} failed) in {:.1}s",
                report.total_targets,
                if report.total_targets == 1 { "" } else { "s" },
                report.successful,
                report.failed,
                report.elapsed_seconds
            );
            if let Some(bundle) = &report.bundle_path {
                println!("Results bundled in {}", bundle.display());
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("tls_scrape error: {:#}", e);
            process::exit(1);
        }
    }
}
