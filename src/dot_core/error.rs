//! Error types for the dot engine
//!
//! Everything here is fatal: an alignment or continuity violation means the
//! persisted series (or the scheduler feeding it) is corrupted, and a schema
//! mismatch means a state blob we did not write. Recoverable conditions
//! (label lookup misses, empty live buckets) are logged at the call site and
//! never surface as a `DotError`.

use crate::store::StoreError;

#[derive(Debug)]
pub enum DotError {
    /// Timestamp is not an exact multiple of the bucket period.
    Alignment { timestamp: i64 },
    /// Two consecutive bucket timestamps are not exactly one period apart.
    Continuity { prev: i64, next: i64, delta: i64 },
    /// Persisted aggregator state has unexpected or missing fields.
    Schema(String),
    /// Collaborator read/write failure. No retry: the run aborts and is
    /// resumed later, which is safe because all inserts are insert-if-absent.
    Storage(String),
    /// Live processing requires at least one persisted record to resume from.
    NoBaseline,
}

impl std::fmt::Display for DotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DotError::Alignment { timestamp } => {
                write!(f, "timestamp {} is not bucket-aligned", timestamp)
            }
            DotError::Continuity { prev, next, delta } => {
                write!(
                    f,
                    "bad timestamp {}, delta {} (previous {})",
                    next, delta, prev
                )
            }
            DotError::Schema(msg) => write!(f, "invalid dot state: {}", msg),
            DotError::Storage(msg) => write!(f, "storage error: {}", msg),
            DotError::NoBaseline => {
                write!(f, "no dot data, please run the backfill task first")
            }
        }
    }
}

impl std::error::Error for DotError {}

impl From<StoreError> for DotError {
    fn from(err: StoreError) -> Self {
        DotError::Storage(err.to_string())
    }
}
