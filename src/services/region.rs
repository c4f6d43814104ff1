// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Coordinate privacy rounding and region bucketing.
//!
//! Two precisions are in play: the storage precision (default 3
//! decimals, ~111 m at the equator) applied to event coordinates, and
//! the coarser region precision (default 2 decimals) that buckets
//! events into heatmap cells. Multiple events collapsing into one
//! bucket is the point, not a bug.

use crate::config::Config;

/// Delimiter between the two halves of a region key.
const REGION_KEY_DELIMITER: char = '_';

/// Round a coordinate to `precision` decimal places, half away from
/// zero.
///
/// Negative zero normalizes to positive zero so keys formatted from
/// the result are stable.
pub fn round_coordinate(value: f64, precision: u32) -> f64 {
    let multiplier = 10f64.powi(precision as i32);
    let rounded = (value * multiplier).round() / multiplier;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Quantization service holding the configured precisions.
#[derive(Debug, Clone, Copy)]
pub struct RegionService {
    coordinate_precision: u32,
    region_precision: u32,
}

impl Default for RegionService {
    fn default() -> Self {
        Self {
            coordinate_precision: 3,
            region_precision: 2,
        }
    }
}

impl RegionService {
    pub fn new(config: &Config) -> Self {
        Self {
            coordinate_precision: config.coordinate_precision,
            region_precision: config.region_precision,
        }
    }

    /// Round a coordinate pair to the storage precision.
    pub fn round_for_storage(&self, lat: f64, lng: f64) -> (f64, f64) {
        (
            round_coordinate(lat, self.coordinate_precision),
            round_coordinate(lng, self.coordinate_precision),
        )
    }

    /// Derive the region bucket key for a coordinate pair.
    ///
    /// Identical rounded coordinates always yield an identical key, so
    /// aggregate increments accumulate in the right bucket. The key is
    /// formatted with exactly `region_precision` decimals on each half.
    pub fn region_key(&self, lat: f64, lng: f64) -> String {
        let precision = self.region_precision as usize;
        let lat = round_coordinate(lat, self.region_precision);
        let lng = round_coordinate(lng, self.region_precision);
        format!(
            "{lat:.precision$}{REGION_KEY_DELIMITER}{lng:.precision$}",
            lat = lat,
            lng = lng,
            precision = precision
        )
    }
}

/// Decode a region key back into coordinates for heatmap rendering.
///
/// Keys are opaque identifiers everywhere else; this validated decode
/// lives only at the presentation boundary. Returns `None` for
/// malformed keys or out-of-range coordinates.
pub fn decode_region_key(key: &str) -> Option<(f64, f64)> {
    let (lat_part, lng_part) = key.split_once(REGION_KEY_DELIMITER)?;

    let lat: f64 = lat_part.parse().ok()?;
    let lng: f64 = lng_part.parse().ok()?;

    if !lat.is_finite() || !lng.is_finite() {
        return None;
    }
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return None;
    }

    Some((lat, lng))
}
