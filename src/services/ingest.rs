// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Feed ingestion orchestration.
//!
//! Takes a validated submission, applies the privacy transforms, and
//! hands the result to the atomic store transaction. Only rounded
//! coordinates exist past this point.

use chrono::Utc;
use uuid::Uuid;

use crate::config::Config;
use crate::db::{FirestoreDb, IngestDecision, RateLimitPolicy};
use crate::error::AppError;
use crate::models::FeedEvent;
use crate::services::region::RegionService;
use crate::time_utils::format_utc_rfc3339;

/// Result of a submission, as seen by the HTTP layer.
#[derive(Debug, Clone)]
pub enum IngestOutcome {
    Recorded(IngestReceipt),
    RateLimited,
}

/// Receipt for an accepted submission.
#[derive(Debug, Clone)]
pub struct IngestReceipt {
    pub feed_id: String,
    pub today_total: u64,
    pub timestamp: String,
}

/// Service for processing feed submissions.
#[derive(Clone)]
pub struct IngestService {
    db: FirestoreDb,
    regions: RegionService,
    policy: RateLimitPolicy,
}

impl IngestService {
    pub fn new(db: FirestoreDb, regions: RegionService, config: &Config) -> Self {
        Self {
            db,
            regions,
            policy: RateLimitPolicy {
                max_requests: config.rate_limit_max_requests,
                window_ms: config.rate_limit_window_ms,
            },
        }
    }

    /// Record one submission.
    ///
    /// Coordinates arrive raw from the validated request body and are
    /// quantized here; the event row gets the storage-precision pair,
    /// the region bucket the coarser one. Both derive from the same
    /// reading so nearby ties bucket consistently.
    pub async fn submit(
        &self,
        lat: f64,
        lng: f64,
        anonymous_id: &str,
    ) -> Result<IngestOutcome, AppError> {
        let now = Utc::now();
        let (rounded_lat, rounded_lng) = self.regions.round_for_storage(lat, lng);
        let region_key = self.regions.region_key(lat, lng);

        let event = FeedEvent {
            id: Uuid::new_v4().to_string(),
            lat: rounded_lat,
            lng: rounded_lng,
            anonymous_id: anonymous_id.to_string(),
            created_at: format_utc_rfc3339(now),
        };

        match self
            .db
            .record_feed_atomic(&event, &region_key, self.policy, now)
            .await?
        {
            IngestDecision::Recorded { today_total } => Ok(IngestOutcome::Recorded(IngestReceipt {
                feed_id: event.id,
                today_total,
                timestamp: event.created_at,
            })),
            IngestDecision::RateLimited => Ok(IngestOutcome::RateLimited),
        }
    }
}
