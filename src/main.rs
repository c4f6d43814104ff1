// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OneMeal API Server
//!
//! Records anonymous stray-feeding events and serves aggregated,
//! privacy-preserving statistics for the map and dashboard clients.

use onemeal_tracker::{
    config::Config,
    db::FirestoreDb,
    services::{IngestService, RegionService, RetentionSweeper, SummaryService},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting OneMeal API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Build services around the shared store handle
    let regions = RegionService::new(&config);
    tracing::info!(
        coordinate_precision = config.coordinate_precision,
        region_precision = config.region_precision,
        "Privacy quantization configured"
    );

    let ingest = IngestService::new(db.clone(), regions, &config);
    let summary = SummaryService::new(db.clone(), config.summary_cache_secs);
    let sweeper = RetentionSweeper::new(db.clone(), &config);

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        ingest,
        summary,
        sweeper,
    });

    // Build router
    let app = onemeal_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("onemeal_tracker=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
