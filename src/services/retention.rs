// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scheduled data-retention sweep.
//!
//! Deletes raw feed events past the retention horizon and prunes
//! aggregates that are both stale and low-signal. The daily stats
//! ledger and high-activity regions are never touched: they are the
//! durable record that survives raw-event deletion.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::db::FirestoreDb;
use crate::error::AppError;

/// Rate-limit bookkeeping rows older than this are reclaimable,
/// independent of the event retention horizon.
const RATE_LIMIT_BOOKKEEPING_DAYS: i64 = 7;

/// Deletion counts from one sweep, for observability.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub deleted_events: usize,
    pub deleted_rate_limit_records: usize,
    pub deleted_regions: usize,
}

/// Retention thresholds, from config.
#[derive(Debug, Clone, Copy)]
struct RetentionPolicy {
    retention_days: i64,
    stale_days: i64,
    min_retain_count: u64,
}

/// Batch job deleting expired raw data while preserving aggregates.
///
/// Invoked on an external schedule via the task endpoint; it never
/// triggers itself.
#[derive(Clone)]
pub struct RetentionSweeper {
    db: FirestoreDb,
    policy: RetentionPolicy,
}

impl RetentionSweeper {
    pub fn new(db: FirestoreDb, config: &Config) -> Self {
        Self {
            db,
            policy: RetentionPolicy {
                retention_days: config.data_retention_days,
                stale_days: config.region_stale_days,
                min_retain_count: config.region_min_retain_count,
            },
        }
    }

    /// Run one sweep.
    ///
    /// Each phase deletes everything past its cutoff, so an immediate
    /// second run finds nothing left to delete. Errors propagate: a
    /// silently failed sweep would mean unbounded raw-data retention,
    /// so the caller must surface them loudly.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepReport, AppError> {
        tracing::info!("Starting data retention sweep");

        let event_cutoff = now - Duration::days(self.policy.retention_days);
        let deleted_events = self.db.delete_feeds_before(event_cutoff).await?;
        tracing::info!(
            count = deleted_events,
            cutoff = %event_cutoff,
            "Deleted expired feed events"
        );

        let rate_cutoff = now - Duration::days(RATE_LIMIT_BOOKKEEPING_DAYS);
        let deleted_rate_limit_records = self.db.delete_rate_windows_before(rate_cutoff).await?;
        tracing::info!(
            count = deleted_rate_limit_records,
            "Deleted stale rate-limit windows"
        );

        let stale_cutoff = now - Duration::days(self.policy.stale_days);
        let deleted_regions = self
            .db
            .delete_stale_regions(stale_cutoff, self.policy.min_retain_count)
            .await?;
        tracing::info!(
            count = deleted_regions,
            min_retain_count = self.policy.min_retain_count,
            "Pruned stale low-activity regions"
        );

        let report = SweepReport {
            deleted_events,
            deleted_rate_limit_records,
            deleted_regions,
        };
        tracing::info!(?report, "Retention sweep complete");

        Ok(report)
    }
}
