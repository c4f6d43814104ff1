// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Retention sweeper tests against the Firestore emulator.

use chrono::{Duration, Utc};
use onemeal_tracker::models::{FeedEvent, RateLimitWindow, RegionAggregate};
use onemeal_tracker::time_utils::format_utc_rfc3339;
use uuid::Uuid;

mod common;

fn event_aged(days: i64, lat: f64, lng: f64) -> FeedEvent {
    FeedEvent {
        id: Uuid::new_v4().to_string(),
        lat,
        lng,
        anonymous_id: Uuid::new_v4().to_string(),
        created_at: format_utc_rfc3339(Utc::now() - Duration::days(days)),
    }
}

#[tokio::test]
async fn test_sweep_honors_retention_and_staleness_rules() {
    require_emulator!();

    let state = common::build_state(common::test_db().await);
    let now = Utc::now();

    // One event past the 90-day horizon, one inside it
    let expired = event_aged(91, 10.001, 10.001);
    let retained = event_aged(89, 10.002, 10.002);
    state.db.set_feed(&expired).await.unwrap();
    state.db.set_feed(&retained).await.unwrap();

    // A stale low-signal region (pruned) and a stale high-signal one
    // (kept forever as historical record)
    let old_touch = format_utc_rfc3339(now - Duration::days(200));
    state
        .db
        .set_region(&RegionAggregate {
            region_key: "10.00_10.00".to_string(),
            feed_count: 2,
            last_feed_at: old_touch.clone(),
        })
        .await
        .unwrap();
    state
        .db
        .set_region(&RegionAggregate {
            region_key: "20.00_20.00".to_string(),
            feed_count: 500,
            last_feed_at: old_touch.clone(),
        })
        .await
        .unwrap();
    // Low-signal but recently active: kept (both conditions required)
    state
        .db
        .set_region(&RegionAggregate {
            region_key: "30.00_30.00".to_string(),
            feed_count: 2,
            last_feed_at: format_utc_rfc3339(now - Duration::days(3)),
        })
        .await
        .unwrap();

    // Rate-limit bookkeeping older than 7 days is reclaimable
    let stale_window_id = Uuid::new_v4().to_string();
    state
        .db
        .set_rate_window(&RateLimitWindow {
            anonymous_id: stale_window_id.clone(),
            window_start: format_utc_rfc3339(now - Duration::days(8)),
            count: 3,
        })
        .await
        .unwrap();

    let report = state.sweeper.sweep(now).await.unwrap();

    assert!(report.deleted_events >= 1);
    assert!(report.deleted_rate_limit_records >= 1);
    assert!(report.deleted_regions >= 1);

    assert!(state.db.get_feed(&expired.id).await.unwrap().is_none());
    assert!(state.db.get_feed(&retained.id).await.unwrap().is_some());

    assert!(state.db.get_region("10.00_10.00").await.unwrap().is_none());
    assert!(state.db.get_region("20.00_20.00").await.unwrap().is_some());
    assert!(state.db.get_region("30.00_30.00").await.unwrap().is_some());

    assert!(state
        .db
        .get_rate_window(&stale_window_id)
        .await
        .unwrap()
        .is_none());

    // Idempotence: an immediate second sweep finds nothing to delete
    let second = state.sweeper.sweep(now).await.unwrap();
    assert_eq!(second.deleted_events, 0);
    assert_eq!(second.deleted_rate_limit_records, 0);
    assert_eq!(second.deleted_regions, 0);
}
