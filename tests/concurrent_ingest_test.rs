// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Concurrency tests for the atomic ingestion transaction.
//!
//! Increments targeting the same region bucket or the same identity's
//! rate window must serialize through transaction conflict-retry; a
//! lost update here would silently undercount the aggregates.

use onemeal_tracker::services::IngestOutcome;
use uuid::Uuid;

mod common;

const NUM_CONCURRENT_FEEDS: usize = 10;

#[tokio::test]
async fn test_concurrent_same_region_increments_are_not_lost() {
    require_emulator!();

    let state = common::build_state(common::test_db().await);

    let mut handles = vec![];
    for _ in 0..NUM_CONCURRENT_FEEDS {
        let state = state.clone();
        handles.push(tokio::spawn(async move {
            let feeder = Uuid::new_v4().to_string();
            state.ingest.submit(55.7558, 37.6173, &feeder).await
        }));
    }

    for handle in handles {
        let outcome = handle
            .await
            .expect("Task join failed")
            .expect("Ingestion failed");
        assert!(matches!(outcome, IngestOutcome::Recorded(_)));
    }

    let region = state
        .db
        .get_region("55.76_37.62")
        .await
        .expect("Failed to fetch region")
        .expect("Region aggregate not found");

    assert_eq!(
        region.feed_count, NUM_CONCURRENT_FEEDS as u64,
        "Region count mismatch due to lost update"
    );
}

#[tokio::test]
async fn test_concurrent_burst_from_one_identity_cannot_overshoot() {
    require_emulator!();

    let state = common::build_state(common::test_db().await);
    let anonymous_id = Uuid::new_v4().to_string();
    let max = state.config.rate_limit_max_requests as usize;

    // Two more than the limit, all racing
    let mut handles = vec![];
    for _ in 0..max + 2 {
        let state = state.clone();
        let anonymous_id = anonymous_id.clone();
        handles.push(tokio::spawn(async move {
            state.ingest.submit(59.9139, 10.7522, &anonymous_id).await
        }));
    }

    let mut recorded = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle
            .await
            .expect("Task join failed")
            .expect("Ingestion failed")
        {
            IngestOutcome::Recorded(_) => recorded += 1,
            IngestOutcome::RateLimited => rejected += 1,
        }
    }

    assert_eq!(recorded, max, "Admission overshot the rate limit");
    assert_eq!(rejected, 2);

    let region = state
        .db
        .get_region("59.91_10.75")
        .await
        .expect("Failed to fetch region")
        .expect("Region aggregate not found");
    assert_eq!(region.feed_count, max as u64);
}
