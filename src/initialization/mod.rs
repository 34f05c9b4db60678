//! Application initialization and resource setup.
//!
//! This module provides functions to initialize all shared resources:
//! - Logger
//! - DNS resolver (reverse lookups for IP targets)
//! - Root certificate store
//! - HTTP client (OCSP requests)
//! - Crypto provider and concurrency gate
//!
//! All initialization functions return proper error types for error handling.

mod client;
mod logger;
mod resolver;
mod roots;

use std::sync::Arc;

use rustls::crypto::{ring::default_provider, CryptoProvider};
use tokio::sync::Semaphore;

// Re-export public API
pub use client::init_client;
pub use logger::init_logger_with;
pub use resolver::init_resolver;
pub use roots::init_root_store;

/// Initializes a semaphore for controlling concurrency.
///
/// # Arguments
///
/// * `count` - Maximum number of concurrent operations allowed
///
/// # Returns
///
/// An `Arc<Semaphore>` that can be shared across multiple tasks.
pub fn init_semaphore(count: usize) -> Arc<Semaphore> {
    Arc::new(Semaphore::new(count))
}

/// Initializes the crypto provider for TLS operations.
///
/// Installs `ring` as the process-wide `rustls` provider. Must be called
/// before any TLS connection is established.
pub fn init_crypto_provider() {
    // The return value is ignored because reinstalling the provider is harmless
    let _ = CryptoProvider::install_default(default_provider());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_semaphore_permits() {
        let semaphore = init_semaphore(3);
        assert_eq!(semaphore.available_permits(), 3);
    }

    #[test]
    fn test_init_crypto_provider_is_idempotent() {
        init_crypto_provider();
        init_crypto_provider();
        assert!(CryptoProvider::get_default().is_some());
    }

    #[test]
    fn test_init_client() {
        assert!(init_client().is_ok());
    }
}
