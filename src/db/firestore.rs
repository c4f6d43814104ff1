// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Feed events (raw, privacy-rounded submissions)
//! - Region aggregates (durable heatmap buckets)
//! - Daily stats (permanent per-day ledger)
//! - Rate-limit windows (per-identity admission state)
//!
//! The atomic ingestion path (`record_feed_atomic`) is the unit of
//! mutual exclusion for the whole write side: rate-limit admission,
//! the event insert, and both aggregate upserts commit together or
//! not at all.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::db::collections;
use crate::error::AppError;
use crate::models::{DailyStats, FeedEvent, RateLimitWindow, RegionAggregate};
use crate::time_utils::{day_key, format_utc_rfc3339, start_of_day_utc};

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Rate-limit parameters applied during atomic ingestion.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window_ms: i64,
}

/// Outcome of the atomic ingestion transaction.
#[derive(Debug, Clone)]
pub enum IngestDecision {
    /// All four writes committed.
    Recorded {
        /// The day's running total, including this event
        today_total: u64,
    },
    /// Admission denied; nothing was written.
    RateLimited,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // Use ExternalJwtFunctionSource to provide a dummy token without needing async-trait
        // or a custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Feed Event Operations ───────────────────────────────────

    /// Get a feed event by ID.
    pub async fn get_feed(&self, id: &str) -> Result<Option<FeedEvent>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::FEEDS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a feed event directly (non-transactional).
    ///
    /// The ingestion path goes through `record_feed_atomic`; this is
    /// for backfill and test seeding.
    pub async fn set_feed(&self, event: &FeedEvent) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::FEEDS)
            .document_id(&event.id)
            .object(event)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Region Aggregate Operations ─────────────────────────────

    /// Get a region aggregate by region key.
    pub async fn get_region(&self, region_key: &str) -> Result<Option<RegionAggregate>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::REGION_AGGREGATES)
            .obj()
            .one(region_key)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a region aggregate directly (non-transactional).
    pub async fn set_region(&self, region: &RegionAggregate) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::REGION_AGGREGATES)
            .document_id(&region.region_key)
            .object(region)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Daily Stats Operations ──────────────────────────────────

    /// Get the stats row for a day ("YYYY-MM-DD").
    pub async fn get_daily_stats(&self, day: &str) -> Result<Option<DailyStats>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::DAILY_STATS)
            .obj()
            .one(day)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Rate Limit Operations ───────────────────────────────────

    /// Get the rate-limit window for an identity.
    pub async fn get_rate_window(
        &self,
        anonymous_id: &str,
    ) -> Result<Option<RateLimitWindow>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::RATE_LIMITS)
            .obj()
            .one(anonymous_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a rate-limit window directly (non-transactional).
    pub async fn set_rate_window(&self, window: &RateLimitWindow) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::RATE_LIMITS)
            .document_id(&window.anonymous_id)
            .object(window)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Atomic Ingestion ────────────────────────────────────────

    /// Atomically record one admitted feed event.
    ///
    /// Within a single Firestore transaction:
    /// 1. Read the identity's rate-limit window; reject (rollback, no
    ///    writes) unless the windowed count is below the limit.
    /// 2. Insert the (already rounded) feed event.
    /// 3. Upsert the region aggregate: increment and touch.
    /// 4. Upsert the day's stats: increment total, track the identity.
    ///
    /// If another request modifies any of these documents concurrently,
    /// Firestore retries the transaction with fresh data, so increments
    /// targeting the same region or day are never lost.
    pub async fn record_feed_atomic(
        &self,
        event: &FeedEvent,
        region_key: &str,
        policy: RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> Result<IngestDecision, AppError> {
        let day = day_key(now);

        // Begin a transaction
        let mut transaction = self
            .get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        // 1. Read the rate-limit window within the transaction.
        //    This registers the document for conflict detection, so a
        //    burst from one identity serializes instead of overshooting.
        let window: Option<RateLimitWindow> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::RATE_LIMITS)
            .obj()
            .one(&event.anonymous_id)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read rate limit in transaction: {}", e))
            })?;

        let mut window =
            window.unwrap_or_else(|| RateLimitWindow::new(&event.anonymous_id, now));

        if !window.admit(now, policy.window_ms, policy.max_requests) {
            tracing::debug!(count = window.count, "Submission rejected by rate limit");
            // Rollback the transaction since we don't need to write
            let _ = transaction.rollback().await;
            return Ok(IngestDecision::RateLimited);
        }

        // 2. Read the region aggregate and fold the event in
        let region: Option<RegionAggregate> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::REGION_AGGREGATES)
            .obj()
            .one(region_key)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read region in transaction: {}", e))
            })?;

        let region = match region {
            Some(mut region) => {
                region.apply_feed(&event.created_at);
                region
            }
            None => RegionAggregate::first_feed(region_key, &event.created_at),
        };

        // 3. Read the day's stats and fold the event in
        let daily: Option<DailyStats> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::DAILY_STATS)
            .obj()
            .one(&day)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read daily stats in transaction: {}", e))
            })?;

        let daily = match daily {
            Some(mut daily) => {
                daily.record_feed(&event.anonymous_id);
                daily
            }
            None => DailyStats::first_feed(
                &format_utc_rfc3339(start_of_day_utc(now)),
                &event.anonymous_id,
            ),
        };

        // 4. Stage all four writes
        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::FEEDS)
            .document_id(&event.id)
            .object(event)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add feed event to transaction: {}", e))
            })?;

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::REGION_AGGREGATES)
            .document_id(region_key)
            .object(&region)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add region to transaction: {}", e))
            })?;

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::DAILY_STATS)
            .document_id(&day)
            .object(&daily)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add daily stats to transaction: {}", e))
            })?;

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::RATE_LIMITS)
            .document_id(&event.anonymous_id)
            .object(&window)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add rate limit to transaction: {}", e))
            })?;

        // 5. Commit the transaction atomically
        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            region_key,
            day = %day,
            today_total = daily.total_feeds,
            "Feed recorded atomically"
        );

        Ok(IngestDecision::Recorded {
            today_total: daily.total_feeds,
        })
    }

    // ─── Summary Reads ───────────────────────────────────────────

    /// Count feed events created at or after `start`.
    pub async fn count_feeds_since(&self, start: DateTime<Utc>) -> Result<u64, AppError> {
        let events = self.feeds_since(start).await?;
        Ok(events.len() as u64)
    }

    /// Count distinct anonymous identities among events created at or
    /// after `start`.
    pub async fn count_unique_feeders_since(&self, start: DateTime<Utc>) -> Result<u64, AppError> {
        let events = self.feeds_since(start).await?;
        let feeders: HashSet<&str> = events.iter().map(|e| e.anonymous_id.as_str()).collect();
        Ok(feeders.len() as u64)
    }

    /// Fetch feed events created at or after `start`.
    async fn feeds_since(&self, start: DateTime<Utc>) -> Result<Vec<FeedEvent>, AppError> {
        let start = format_utc_rfc3339(start);
        self.get_client()?
            .fluent()
            .select()
            .from(collections::FEEDS)
            .filter(move |q| {
                q.for_all([q.field("created_at").greater_than_or_equal(start.clone())])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Top region aggregates ordered by feed count descending.
    pub async fn top_regions(&self, limit: u32) -> Result<Vec<RegionAggregate>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::REGION_AGGREGATES)
            .order_by([(
                "feed_count",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Most recent daily stats rows ordered by date descending.
    pub async fn recent_daily_stats(&self, limit: u32) -> Result<Vec<DailyStats>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::DAILY_STATS)
            .order_by([("date", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Retention Sweep Operations ──────────────────────────────

    /// Delete feed events older than `cutoff`. Returns the count.
    pub async fn delete_feeds_before(&self, cutoff: DateTime<Utc>) -> Result<usize, AppError> {
        let cutoff = format_utc_rfc3339(cutoff);
        let events: Vec<FeedEvent> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::FEEDS)
            .filter(move |q| q.for_all([q.field("created_at").less_than(cutoff.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.batch_delete(&events, collections::FEEDS, |event: &FeedEvent| {
            event.id.clone()
        })
        .await?;

        Ok(events.len())
    }

    /// Delete rate-limit windows whose window opened before `cutoff`.
    /// Returns the count.
    pub async fn delete_rate_windows_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, AppError> {
        let cutoff = format_utc_rfc3339(cutoff);
        let windows: Vec<RateLimitWindow> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::RATE_LIMITS)
            .filter(move |q| q.for_all([q.field("window_start").less_than(cutoff.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.batch_delete(
            &windows,
            collections::RATE_LIMITS,
            |window: &RateLimitWindow| window.anonymous_id.clone(),
        )
        .await?;

        Ok(windows.len())
    }

    /// Delete region aggregates that are both stale (no feed since
    /// `stale_cutoff`) and low-signal (`feed_count < min_retain_count`).
    /// High-count regions are retained indefinitely. Returns the count.
    pub async fn delete_stale_regions(
        &self,
        stale_cutoff: DateTime<Utc>,
        min_retain_count: u64,
    ) -> Result<usize, AppError> {
        let cutoff = format_utc_rfc3339(stale_cutoff);
        let regions: Vec<RegionAggregate> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::REGION_AGGREGATES)
            .filter(move |q| {
                q.for_all([
                    q.field("last_feed_at").less_than(cutoff.clone()),
                    q.field("feed_count").less_than(min_retain_count),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.batch_delete(
            &regions,
            collections::REGION_AGGREGATES,
            |region: &RegionAggregate| region.region_key.clone(),
        )
        .await?;

        Ok(regions.len())
    }

    // ─── Helper Methods ────────────────────────────────────────────

    /// Helper to batch delete documents using transactions.
    ///
    /// Chunked so a sweep over a large backlog never holds one
    /// long-lived transaction that starves concurrent ingestion.
    async fn batch_delete<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&T) -> String,
    {
        let client = self.get_client()?;

        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }
}
