// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod ingest;
pub mod region;
pub mod retention;
pub mod summary;

pub use ingest::{IngestOutcome, IngestReceipt, IngestService};
pub use region::RegionService;
pub use retention::{RetentionSweeper, SweepReport};
pub use summary::{SummaryRange, SummaryService};
