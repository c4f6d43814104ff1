// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Raw feed event model for storage.

use serde::{Deserialize, Serialize};

/// Stored feed event record in Firestore.
///
/// Coordinates are privacy-rounded before this struct is ever
/// constructed; the raw GPS reading does not reach storage or logs.
/// Events are retained for a bounded window and deleted by the
/// retention sweeper; the region and daily aggregates are the durable
/// record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedEvent {
    /// Server-generated UUID (also used as document ID)
    pub id: String,
    /// Latitude, rounded to the storage precision
    pub lat: f64,
    /// Longitude, rounded to the storage precision
    pub lng: f64,
    /// Client-generated opaque identity token (UUID-shaped, no PII)
    pub anonymous_id: String,
    /// Write timestamp (RFC3339 UTC, server clock)
    pub created_at: String,
}
