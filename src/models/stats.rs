//! Per-day statistics aggregates for efficient dashboard queries.
//!
//! One document per UTC calendar day, updated atomically with the
//! event write. Days are a permanent historical ledger: the retention
//! sweeper never deletes them.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Pre-computed statistics for one calendar day.
///
/// Stored at: `daily_stats/{YYYY-MM-DD}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyStats {
    /// Start of the day (RFC3339 UTC midnight)
    pub date: String,
    /// Events recorded this day
    #[serde(default)]
    pub total_feeds: u64,
    /// Distinct anonymous identities active this day
    #[serde(default)]
    pub unique_feeders: u64,
    /// Identities seen this day, backing `unique_feeders` exactly.
    /// Internal bookkeeping only; never exposed on the wire.
    #[serde(default)]
    pub feeder_ids: HashSet<String>,
}

impl DailyStats {
    /// Fresh stats row for the first event of a day.
    pub fn first_feed(date: &str, anonymous_id: &str) -> Self {
        let mut feeder_ids = HashSet::new();
        feeder_ids.insert(anonymous_id.to_string());
        Self {
            date: date.to_string(),
            total_feeds: 1,
            unique_feeders: 1,
            feeder_ids,
        }
    }

    /// Fold one more event into the day.
    pub fn record_feed(&mut self, anonymous_id: &str) {
        self.total_feeds += 1;
        self.feeder_ids.insert(anonymous_id.to_string());
        self.unique_feeders = self.feeder_ids.len() as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_feed_seeds_counts() {
        let stats = DailyStats::first_feed("2024-01-15T00:00:00Z", "u1");

        assert_eq!(stats.total_feeds, 1);
        assert_eq!(stats.unique_feeders, 1);
        assert!(stats.feeder_ids.contains("u1"));
    }

    #[test]
    fn test_record_feed_counts_distinct_feeders() {
        let mut stats = DailyStats::first_feed("2024-01-15T00:00:00Z", "u1");

        stats.record_feed("u2");
        stats.record_feed("u1"); // repeat identity, same day

        assert_eq!(stats.total_feeds, 3);
        assert_eq!(stats.unique_feeders, 2);
    }

    #[test]
    fn test_deserializes_without_feeder_set() {
        // Older documents may predate the distinct-identity set
        let stats: DailyStats = serde_json::from_str(
            r#"{"date":"2024-01-15T00:00:00Z","total_feeds":4,"unique_feeders":2}"#,
        )
        .unwrap();

        assert_eq!(stats.total_feeds, 4);
        assert!(stats.feeder_ids.is_empty());
    }
}
