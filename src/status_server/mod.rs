//! HTTP status server for monitoring long-running scans.
//!
//! Provides two endpoints:
//! - `/metrics` - Prometheus-compatible metrics
//! - `/status` - JSON progress summary
//!
//! The server runs in the background and does not block scanning.

mod handlers;
mod types;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;

use handlers::{metrics_handler, status_handler};
pub use types::{StatusResponse, StatusState};

fn router(state: StatusState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/status", get(status_handler))
        .with_state(state)
}

/// Serves the status endpoints on an already bound listener.
pub async fn serve(listener: TcpListener, state: StatusState) -> Result<(), anyhow::Error> {
    axum::serve(listener, router(state))
        .await
        .map_err(|e| anyhow::anyhow!("Status server error: {}", e))
}

/// Binds 127.0.0.1:`port` and serves the status endpoints.
pub async fn start_status_server(port: u16, state: StatusState) -> Result<(), anyhow::Error> {
    let listener = TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind status server to port {}: {}", port, e))?;

    log::info!("Status server listening on http://127.0.0.1:{}/", port);
    log::info!("  - Metrics: http://127.0.0.1:{}/metrics", port);
    log::info!("  - Status: http://127.0.0.1:{}/status", port);

    serve(listener, state).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{ScanMetrics, ScrapeStatus};
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    async fn spawn_server(state: StatusState) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve(listener, state));
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_metrics_endpoint_serves_counters() {
        let metrics = Arc::new(ScanMetrics::new());
        metrics.record(ScrapeStatus::Success);
        let base = spawn_server(StatusState::new(Arc::clone(&metrics))).await;

        let body = reqwest::get(format!("{base}/metrics"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(body.contains("tls_scrapes_total{status=\"success\"} 1"));

        // Later increments are visible on the next scrape
        metrics.record(ScrapeStatus::Failed);
        let body = reqwest::get(format!("{base}/metrics"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(body.contains("tls_scrapes_total{status=\"failed\"} 1"));
    }

    #[tokio::test]
    async fn test_status_endpoint_reports_progress() {
        let metrics = Arc::new(ScanMetrics::new());
        metrics.record(ScrapeStatus::Success);
        metrics.record(ScrapeStatus::Failed);
        let state = StatusState::new(metrics);
        state.total_targets.store(4, Ordering::SeqCst);
        let base = spawn_server(state).await;

        let text = reqwest::get(format!("{base}/status"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(body["total_targets"], 4);
        assert_eq!(body["succeeded"], 1);
        assert_eq!(body["failed"], 1);
        assert_eq!(body["pending"], 2);
        assert_eq!(body["percentage_complete"], 50.0);
    }

    #[tokio::test]
    async fn test_start_status_server_port_in_use() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let err = start_status_server(port, StatusState::new(Arc::new(ScanMetrics::new())))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to bind status server"));
    }
}
