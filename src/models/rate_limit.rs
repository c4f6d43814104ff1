// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-identity rate-limit window state.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::time_utils::format_utc_rfc3339;

/// Submission counter for one anonymous identity within a trailing
/// window.
///
/// Stored at: `rate_limits/{anonymous_id}` and read-modify-written
/// inside the ingestion transaction, so the admission check and the
/// counter increment are one serializable unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitWindow {
    pub anonymous_id: String,
    /// When the current window opened (RFC3339 UTC)
    pub window_start: String,
    /// Accepted submissions since `window_start`
    pub count: u32,
}

impl RateLimitWindow {
    /// Fresh window for an identity's first submission.
    pub fn new(anonymous_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            anonymous_id: anonymous_id.to_string(),
            window_start: format_utc_rfc3339(now),
            count: 0,
        }
    }

    /// Check-and-count admission.
    ///
    /// Resets the window if it has fully elapsed, then admits iff the
    /// accepted count is below `max_requests`. On admission the counter
    /// is incremented; on rejection nothing changes.
    pub fn admit(&mut self, now: DateTime<Utc>, window_ms: i64, max_requests: u32) -> bool {
        let expired = DateTime::parse_from_rfc3339(&self.window_start)
            .map(|start| now.signed_duration_since(start) >= Duration::milliseconds(window_ms))
            // Unparseable window start: treat as expired and start over
            .unwrap_or(true);

        if expired {
            self.window_start = format_utc_rfc3339(now);
            self.count = 0;
        }

        if self.count >= max_requests {
            return false;
        }

        self.count += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const DAY_MS: i64 = 86_400_000;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_admits_up_to_limit() {
        let mut window = RateLimitWindow::new("u1", at(8));

        for _ in 0..10 {
            assert!(window.admit(at(9), DAY_MS, 10));
        }
        assert!(!window.admit(at(9), DAY_MS, 10));
        assert_eq!(window.count, 10); // rejection does not count
    }

    #[test]
    fn test_window_resets_after_elapsing() {
        let mut window = RateLimitWindow::new("u1", at(8));
        for _ in 0..10 {
            window.admit(at(8), DAY_MS, 10);
        }
        assert!(!window.admit(at(8), DAY_MS, 10));

        let next_day = at(8) + Duration::milliseconds(DAY_MS);
        assert!(window.admit(next_day, DAY_MS, 10));
        assert_eq!(window.count, 1);
    }

    #[test]
    fn test_corrupt_window_start_resets() {
        let mut window = RateLimitWindow {
            anonymous_id: "u1".to_string(),
            window_start: "garbage".to_string(),
            count: 10,
        };

        assert!(window.admit(at(8), DAY_MS, 10));
        assert_eq!(window.count, 1);
    }
}
