// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API input validation tests (offline, no store required).

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

mod common;

async fn post_feed(app: axum::Router, body: serde_json::Value) -> axum::http::Response<Body> {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri("/api/feed")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

async fn body_json(response: axum::http::Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

const TEST_UUID: &str = "550e8400-e29b-41d4-a716-446655440000";

#[tokio::test]
async fn test_latitude_out_of_range() {
    let (app, _state) = common::create_test_app();

    let response = post_feed(
        app,
        serde_json::json!({"lat": 91.0, "lng": 10.0, "anonymousId": TEST_UUID}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "invalid_data");
    assert!(body["details"]["lat"].is_array());
}

#[tokio::test]
async fn test_longitude_out_of_range() {
    let (app, _state) = common::create_test_app();

    let response = post_feed(
        app,
        serde_json::json!({"lat": 12.0, "lng": -180.5, "anonymousId": TEST_UUID}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["details"]["lng"].is_array());
}

#[tokio::test]
async fn test_non_uuid_anonymous_id() {
    let (app, _state) = common::create_test_app();

    let response = post_feed(
        app,
        serde_json::json!({"lat": 12.0, "lng": 77.0, "anonymousId": "feeder-42"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_fields_rejected() {
    let (app, _state) = common::create_test_app();

    let response = post_feed(app, serde_json::json!({"lat": 12.0})).await;

    // Deserialization failure; exact status is the extractor's choice
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_valid_payload_offline_store_is_generic_500() {
    let (app, _state) = common::create_test_app();

    let response = post_feed(
        app,
        serde_json::json!({"lat": 12.9716, "lng": 77.5946, "anonymousId": TEST_UUID}),
    )
    .await;

    // The mock store fails; the client sees a generic error with no
    // internal detail
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "internal_error");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_feed_api_self_description() {
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/feed")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["endpoint"], "POST /api/feed");
    assert_eq!(body["requiredFields"][2], "anonymousId");
}

#[tokio::test]
async fn test_health_check() {
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
