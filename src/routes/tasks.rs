// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Task handler routes for scheduled jobs.
//!
//! These endpoints are called by Cloud Scheduler / Cloud Tasks, not
//! directly by users.

use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use std::sync::Arc;

/// Task handler routes (called by the external scheduler).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/tasks/cleanup", post(run_cleanup))
}

/// Run the data-retention sweep.
///
/// Returns the per-phase deletion counts for observability. Fails
/// loudly (500 + error log) if the store is unavailable: a silently
/// skipped sweep would retain raw events past the privacy horizon.
async fn run_cleanup(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
) -> Response {
    // Security Check: Ensure request comes from Cloud Tasks.
    // Cloud Run strips this header from external requests, so its presence guarantees internal origin.
    let queue_name_header = headers.get("x-cloudtasks-queuename");
    let is_valid_queue = queue_name_header
        .and_then(|h| h.to_str().ok())
        .map(|name| name == crate::config::CLEANUP_QUEUE_NAME)
        .unwrap_or(false);

    if !is_valid_queue {
        tracing::warn!(
            header = ?queue_name_header,
            "Security Alert: Blocked unauthorized access to cleanup task"
        );
        return StatusCode::FORBIDDEN.into_response();
    }

    match state.sweeper.sweep(chrono::Utc::now()).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Retention sweep failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
