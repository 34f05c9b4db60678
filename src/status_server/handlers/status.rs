//! JSON status handler.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::atomic::Ordering;

use super::super::types::{StatusResponse, StatusState};
use crate::metrics::ScrapeStatus;

/// JSON status endpoint with scan progress
pub async fn status_handler(State(state): State<StatusState>) -> Response {
    let total = state.total_targets.load(Ordering::SeqCst);
    let succeeded = state.metrics.scrapes(ScrapeStatus::Success);
    let failed = state.metrics.scrapes(ScrapeStatus::Failed);
    let attempted = succeeded + failed;
    let elapsed = state.metrics.elapsed().as_secs_f64();

    let rate = if elapsed > 0.0 {
        attempted as f64 / elapsed
    } else {
        0.0
    };
    let percentage = if total > 0 {
        (attempted as f64 / total as f64) * 100.0
    } else {
        0.0
    };

    let response = StatusResponse {
        total_targets: total,
        succeeded,
        failed,
        pending: (total as u64).saturating_sub(attempted),
        percentage_complete: percentage,
        elapsed_seconds: elapsed,
        rate_per_second: rate,
    };

    (StatusCode::OK, Json(response)).into_response()
}
