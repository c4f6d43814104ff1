//! Application configuration loaded from environment variables.
//!
//! Every tunable has a stated default so the service can boot with an
//! empty environment for local development.

use std::env;

/// Cloud Tasks queue that is allowed to invoke the cleanup endpoint.
pub const CLEANUP_QUEUE_NAME: &str = "retention-cleanup";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL for CORS
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,

    // --- Privacy transforms ---
    /// Decimal places kept on stored event coordinates
    pub coordinate_precision: u32,
    /// Decimal places used for region bucket keys (coarser than storage)
    pub region_precision: u32,

    // --- Rate limiting ---
    /// Max accepted submissions per identity per window
    pub rate_limit_max_requests: u32,
    /// Sliding window length in milliseconds
    pub rate_limit_window_ms: i64,

    // --- Retention ---
    /// Raw feed events older than this are deleted by the sweeper
    pub data_retention_days: i64,
    /// Region aggregates idle longer than this are prune candidates
    pub region_stale_days: i64,
    /// Regions with at least this many feeds are never pruned
    pub region_min_retain_count: u64,

    // --- Summary ---
    /// In-process summary cache lifetime in seconds
    pub summary_cache_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: parse_env("PORT", 8080),

            coordinate_precision: parse_env("COORDINATE_PRECISION", 3),
            region_precision: parse_env("REGION_PRECISION", 2),

            rate_limit_max_requests: parse_env("RATE_LIMIT_MAX_REQUESTS", 10),
            rate_limit_window_ms: parse_env("RATE_LIMIT_WINDOW_MS", 86_400_000),

            data_retention_days: parse_env("DATA_RETENTION_DAYS", 90),
            region_stale_days: parse_env("REGION_STALE_DAYS", 180),
            region_min_retain_count: parse_env("REGION_MIN_RETAIN_COUNT", 5),

            summary_cache_secs: parse_env("SUMMARY_CACHE_SECS", 300),
        })
    }

    /// Default config for tests.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:3000".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            coordinate_precision: 3,
            region_precision: 2,
            rate_limit_max_requests: 10,
            rate_limit_window_ms: 86_400_000,
            data_retention_days: 90,
            region_stale_days: 180,
            region_min_retain_count: 5,
            summary_cache_secs: 300,
        }
    }
}

/// Parse an env var, falling back to the default when unset or malformed.
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable {0}: {1}")]
    Invalid(&'static str, String),
}
