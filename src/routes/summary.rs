// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Summary statistics route.

use crate::services::SummaryRange;
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Summary routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/summary", get(get_summary))
}

#[derive(Deserialize)]
struct SummaryQuery {
    /// Time range: today | week | month | all
    range: Option<String>,
}

/// Get aggregate statistics for a time range.
///
/// Always answers 200: failed sub-reads degrade to zero values inside
/// the summary service. The response advertises a short public cache
/// lifetime so CDNs can absorb read load.
async fn get_summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SummaryQuery>,
) -> Response {
    let range = SummaryRange::parse(params.range.as_deref());

    tracing::debug!(range = range.as_str(), "Computing summary");

    let summary = state.summary.summarize(range).await;

    let cache_control = format!(
        "public, s-maxage={}, stale-while-revalidate",
        state.config.summary_cache_secs
    );

    let mut response = Json(summary).into_response();
    if let Ok(value) = HeaderValue::from_str(&cache_control) {
        response.headers_mut().insert(header::CACHE_CONTROL, value);
    }
    response
}
