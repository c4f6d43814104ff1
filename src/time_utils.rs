// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting and day bucketing.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Truncate a timestamp to UTC midnight.
pub fn start_of_day_utc(at: DateTime<Utc>) -> DateTime<Utc> {
    let date = at.date_naive();
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap())
}

/// Day key ("YYYY-MM-DD") used as the DailyStats document id.
pub fn day_key(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_of_day_truncates() {
        let at = Utc.with_ymd_and_hms(2024, 3, 15, 17, 42, 9).unwrap();
        let start = start_of_day_utc(at);
        assert_eq!(format_utc_rfc3339(start), "2024-03-15T00:00:00Z");
    }

    #[test]
    fn test_day_key_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        assert_eq!(day_key(at), "2024-03-05");
    }

    #[test]
    fn test_rfc3339_sorts_lexicographically() {
        let earlier = Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 11, 2, 8, 0, 0).unwrap();
        assert!(format_utc_rfc3339(earlier) < format_utc_rfc3339(later));
    }
}
