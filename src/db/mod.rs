//! Database layer (Firestore).

pub mod firestore;

pub use firestore::{FirestoreDb, IngestDecision, RateLimitPolicy};

/// Collection names as constants.
pub mod collections {
    /// Raw feed events (time-bounded retention)
    pub const FEEDS: &str = "feeds";
    /// Durable per-region aggregates (keyed by region key)
    pub const REGION_AGGREGATES: &str = "region_aggregates";
    /// Per-day stats ledger (keyed by YYYY-MM-DD, never deleted)
    pub const DAILY_STATS: &str = "daily_stats";
    /// Per-identity rate-limit windows (keyed by anonymous id)
    pub const RATE_LIMITS: &str = "rate_limits";
}
