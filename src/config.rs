use crate::dot_core::{DotVersion, DEFAULT_CATCHUP_THRESHOLD_SECS, DEFAULT_HORIZON_SECS};
use std::env;

/// Configuration loaded from environment variables
#[derive(Debug)]
pub struct Config {
    pub db_path: String,
    pub version: DotVersion,
    /// Sentiment analyst version the label tables are keyed by.
    pub label_analyst: String,
    pub backfill_horizon_secs: i64,
    pub catchup_threshold_secs: i64,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Everything has a default; only a malformed DOT_VERSION is an error.
    pub fn from_env() -> Result<Self, String> {
        let db_path = env::var("DOTFLOW_DB_PATH").unwrap_or_else(|_| "data/dotflow.db".to_string());

        let version = match env::var("DOT_VERSION") {
            Ok(s) => DotVersion::from_str(&s)
                .ok_or_else(|| format!("invalid DOT_VERSION '{}', expected v1 or v2", s))?,
            Err(_) => DotVersion::V1,
        };

        let label_analyst = env::var("LABEL_ANALYST").unwrap_or_else(|_| "v3".to_string());

        let backfill_horizon_secs = env::var("BACKFILL_HORIZON_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_HORIZON_SECS);

        let catchup_threshold_secs = env::var("CATCHUP_THRESHOLD_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CATCHUP_THRESHOLD_SECS);

        Ok(Self {
            db_path,
            version,
            label_analyst,
            backfill_horizon_secs,
            catchup_threshold_secs,
        })
    }
}
