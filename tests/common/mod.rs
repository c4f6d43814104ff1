// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use onemeal_tracker::config::Config;
use onemeal_tracker::db::FirestoreDb;
use onemeal_tracker::routes::create_router;
use onemeal_tracker::services::{IngestService, RegionService, RetentionSweeper, SummaryService};
use onemeal_tracker::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Build app state around a database handle.
#[allow(dead_code)]
pub fn build_state(db: FirestoreDb) -> Arc<AppState> {
    let config = Config::test_default();
    let regions = RegionService::new(&config);
    let ingest = IngestService::new(db.clone(), regions, &config);
    let summary = SummaryService::new(db.clone(), config.summary_cache_secs);
    let sweeper = RetentionSweeper::new(db.clone(), &config);

    Arc::new(AppState {
        config,
        db,
        ingest,
        summary,
        sweeper,
    })
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let state = build_state(test_db_offline());
    (create_router(state.clone()), state)
}

/// Create a test app backed by the Firestore emulator.
#[allow(dead_code)]
pub async fn create_emulator_app() -> (axum::Router, Arc<AppState>) {
    let state = build_state(test_db().await);
    (create_router(state.clone()), state)
}
