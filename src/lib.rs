// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! OneMeal: record acts of feeding stray animals, anonymously.
//!
//! This crate provides the backend API for ingesting geolocated feed
//! events from anonymous clients and serving privacy-preserving
//! aggregate statistics (daily totals, regional heatmap).

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{IngestService, RetentionSweeper, SummaryService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub ingest: IngestService,
    pub summary: SummaryService,
    pub sweeper: RetentionSweeper,
}
