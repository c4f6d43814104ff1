// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Summary query engine.
//!
//! Read-only statistics over the persisted aggregates and events.
//! Every sub-read is independently failable: a failed read degrades to
//! its zero value instead of failing the whole response, because the
//! summary is advisory read-many data, not the system of record.
//! Responses are cached in-process per range to absorb read load
//! without blocking writers.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::services::region::decode_region_key;
use crate::time_utils::start_of_day_utc;

/// Heatmap rows returned per summary.
const HEATMAP_LIMIT: u32 = 100;
/// Trending daily-stats rows returned per summary.
const TRENDING_LIMIT: u32 = 30;

/// Time range selector for the summary endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SummaryRange {
    Today,
    Week,
    Month,
    All,
}

impl SummaryRange {
    /// Parse the `range` query parameter; unknown values fall back to
    /// the default, matching the endpoint contract.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("week") => Self::Week,
            Some("month") => Self::Month,
            Some("all") => Self::All,
            _ => Self::Today,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Week => "week",
            Self::Month => "month",
            Self::All => "all",
        }
    }

    /// Start boundary for the range.
    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Today => start_of_day_utc(now),
            Self::Week => now - Duration::days(7),
            Self::Month => now - Duration::days(30),
            Self::All => DateTime::UNIX_EPOCH,
        }
    }
}

// ─── Wire Types ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub range: String,
    pub stats: SummaryStats,
    pub heatmap: Vec<HeatmapPoint>,
    pub trending: Vec<TrendingDay>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub total_feeds: u64,
    pub unique_feeders: u64,
    pub total_impact: u64,
    pub today: TodayStats,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayStats {
    pub feeds: u64,
    pub feeders: u64,
}

/// One heatmap cell: region key decoded back to coordinates.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapPoint {
    pub lat: f64,
    pub lng: f64,
    pub intensity: u64,
    pub last_feed: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingDay {
    pub date: String,
    pub total_feeds: u64,
    pub unique_feeders: u64,
}

struct CachedSummary {
    computed_at: Instant,
    response: SummaryResponse,
}

/// Service computing range summaries with an in-process cache.
#[derive(Clone)]
pub struct SummaryService {
    db: FirestoreDb,
    cache: Arc<DashMap<SummaryRange, CachedSummary>>,
    cache_ttl: std::time::Duration,
}

impl SummaryService {
    pub fn new(db: FirestoreDb, cache_ttl_secs: u64) -> Self {
        Self {
            db,
            cache: Arc::new(DashMap::new()),
            cache_ttl: std::time::Duration::from_secs(cache_ttl_secs),
        }
    }

    /// Compute the summary for a range, serving from cache within the
    /// TTL. Infallible by design: failed sub-reads degrade to zeros.
    pub async fn summarize(&self, range: SummaryRange) -> SummaryResponse {
        if let Some(cached) = self.cache.get(&range) {
            if cached.computed_at.elapsed() < self.cache_ttl {
                return cached.response.clone();
            }
        }

        let response = self.compute(range, Utc::now()).await;

        self.cache.insert(
            range,
            CachedSummary {
                computed_at: Instant::now(),
                response: response.clone(),
            },
        );

        response
    }

    async fn compute(&self, range: SummaryRange, now: DateTime<Utc>) -> SummaryResponse {
        let start = range.start(now);
        let today_start = start_of_day_utc(now);

        let (total_feeds, unique_feeders, regions, daily, today_feeds, today_feeders) = tokio::join!(
            self.db.count_feeds_since(start),
            self.db.count_unique_feeders_since(start),
            self.db.top_regions(HEATMAP_LIMIT),
            self.db.recent_daily_stats(TRENDING_LIMIT),
            self.db.count_feeds_since(today_start),
            self.db.count_unique_feeders_since(today_start),
        );

        let total_feeds = or_zero(total_feeds, "total feed count");
        let unique_feeders = or_zero(unique_feeders, "unique feeder count");
        let regions = or_zero(regions, "region aggregates");
        let daily = or_zero(daily, "daily stats");
        let today_feeds = or_zero(today_feeds, "today's feed count");
        let today_feeders = or_zero(today_feeders, "today's feeder count");

        let heatmap: Vec<HeatmapPoint> = regions
            .into_iter()
            .filter_map(|region| match decode_region_key(&region.region_key) {
                Some((lat, lng)) => Some(HeatmapPoint {
                    lat,
                    lng,
                    intensity: region.feed_count,
                    last_feed: region.last_feed_at,
                }),
                None => {
                    tracing::warn!(region_key = %region.region_key, "Skipping undecodable region key");
                    None
                }
            })
            .collect();

        let trending: Vec<TrendingDay> = daily
            .into_iter()
            .map(|day| TrendingDay {
                date: day.date,
                total_feeds: day.total_feeds,
                unique_feeders: day.unique_feeders,
            })
            .collect();

        SummaryResponse {
            range: range.as_str().to_string(),
            stats: SummaryStats {
                total_feeds,
                unique_feeders,
                total_impact: total_feeds,
                today: TodayStats {
                    feeds: today_feeds,
                    feeders: today_feeders,
                },
            },
            heatmap,
            trending,
            message: motivational_message(today_feeds, total_feeds),
        }
    }
}

/// Degrade a failed sub-read to its zero value with a logged warning.
fn or_zero<T: Default>(result: Result<T, AppError>, what: &str) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, what, "Summary sub-query failed, degrading to zero value");
            T::default()
        }
    }
}

/// Pick a summary line from today's and all-time counts.
///
/// Deterministic (keyed off the totals) so cached responses are stable.
fn motivational_message(today_feeds: u64, total_impact: u64) -> String {
    if total_impact == 0 {
        return "Be the first to make a difference! Feed a stray today.".to_string();
    }

    let messages = [
        format!("Today, {today_feeds} animals were fed by kind souls across the world"),
        format!("Together, we've saved {total_impact} animals from hunger"),
        format!("{today_feeds} acts of compassion today. Every meal matters."),
        format!("{total_impact} lives touched through simple acts of kindness"),
    ];

    let index = (total_impact as usize) % messages.len();
    messages[index].clone()
}
