// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Region bucket aggregate model.

use serde::{Deserialize, Serialize};

/// Durable per-region aggregate, keyed by region key.
///
/// Survives deletion of the underlying raw events: `feed_count` is the
/// number of events ever attributed to this bucket, not the number
/// currently in storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionAggregate {
    /// Coarse-rounded "lat_lng" bucket key (also used as document ID)
    pub region_key: String,
    /// Monotonically non-decreasing feed counter
    pub feed_count: u64,
    /// Timestamp of the most recent contributing event (RFC3339 UTC)
    pub last_feed_at: String,
}

impl RegionAggregate {
    /// Fresh aggregate for a region's first event.
    pub fn first_feed(region_key: &str, now: &str) -> Self {
        Self {
            region_key: region_key.to_string(),
            feed_count: 1,
            last_feed_at: now.to_string(),
        }
    }

    /// Fold one more event into the aggregate.
    pub fn apply_feed(&mut self, now: &str) {
        self.feed_count += 1;
        self.last_feed_at = now.to_string();
    }
}
