//! HTTP client initialization.
//!
//! The client is only used to talk to OCSP responders.

use std::sync::Arc;
use std::time::Duration;

use reqwest::ClientBuilder;

use crate::config::OCSP_TIMEOUT_SECS;
use crate::error_handling::InitializationError;

/// Initializes the HTTP client used for OCSP requests.
///
/// Creates a `reqwest::Client` configured with:
/// - A request timeout of `OCSP_TIMEOUT_SECS`
/// - A crate-specific User-Agent
///
/// # Errors
///
/// Returns `InitializationError::HttpClientError` if client creation fails.
pub fn init_client() -> Result<Arc<reqwest::Client>, InitializationError> {
    let client = ClientBuilder::new()
        .timeout(Duration::from_secs(OCSP_TIMEOUT_SECS))
        .user_agent(concat!("tls_scrape/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(Arc::new(client))
}
