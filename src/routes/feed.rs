// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Feed submission routes.

use crate::error::{AppError, Result};
use crate::services::IngestOutcome;
use crate::AppState;
use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::{Validate, ValidationError};

/// Feed routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/feed", get(describe_feed_api).post(submit_feed))
}

/// Feed submission payload.
///
/// Coordinates here are the only place the precise device location
/// exists server-side; they are quantized before persistence and are
/// never logged.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FeedRequest {
    #[validate(range(min = -90.0, max = 90.0, message = "latitude must be in [-90, 90]"))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "longitude must be in [-180, 180]"))]
    pub lng: f64,
    #[validate(custom(function = "validate_uuid", message = "anonymousId must be a UUID"))]
    pub anonymous_id: String,
}

fn validate_uuid(value: &str) -> std::result::Result<(), ValidationError> {
    uuid::Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|_| ValidationError::new("uuid"))
}

/// Successful submission response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    pub success: bool,
    pub message: String,
    pub data: FeedReceiptData,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedReceiptData {
    pub feed_id: String,
    pub today_total: u64,
    pub timestamp: String,
}

/// Record a feed submission (POST).
async fn submit_feed(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<FeedRequest>,
) -> Result<(StatusCode, Json<FeedResponse>)> {
    payload.validate()?;

    match state
        .ingest
        .submit(payload.lat, payload.lng, &payload.anonymous_id)
        .await?
    {
        IngestOutcome::Recorded(receipt) => {
            tracing::info!(
                feed_id = %receipt.feed_id,
                today_total = receipt.today_total,
                "Feed submission accepted"
            );

            Ok((
                StatusCode::CREATED,
                Json(FeedResponse {
                    success: true,
                    message: "Feed recorded! Thank you for making a difference.".to_string(),
                    data: FeedReceiptData {
                        feed_id: receipt.feed_id,
                        today_total: receipt.today_total,
                        timestamp: receipt.timestamp,
                    },
                }),
            ))
        }
        IngestOutcome::RateLimited => Err(AppError::RateLimited),
    }
}

/// Endpoint self-description.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedApiDescription {
    pub message: String,
    pub endpoint: String,
    pub required_fields: Vec<String>,
}

/// Describe the feed API (GET).
async fn describe_feed_api() -> Json<FeedApiDescription> {
    Json(FeedApiDescription {
        message: "OneMeal Feed API".to_string(),
        endpoint: "POST /api/feed".to_string(),
        required_fields: vec!["lat".to_string(), "lng".to_string(), "anonymousId".to_string()],
    })
}
