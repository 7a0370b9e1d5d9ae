//! Collaborator interfaces: label store, dot store, clock, ticker
//!
//! The engine never touches SQLite (or the wall clock) directly; backfill,
//! live catch-up, and validation are all written against these traits so
//! tests can drive them deterministically. Storage calls are synchronous
//! blocking round-trips; the only async seam is the `Ticker`.

pub mod sqlite;

use crate::dot_core::DotVersion;
use async_trait::async_trait;

pub use sqlite::{SqliteDotStore, SqliteLabelStore};

#[derive(Debug)]
pub enum StoreError {
    Database(String),
    Serialization(serde_json::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err)
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Database(e) => write!(f, "database error: {}", e),
            StoreError::Serialization(e) => write!(f, "serialization error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

/// A classified source event, before its label has been looked up.
#[derive(Debug, Clone)]
pub struct SentimentEvent {
    pub post_hash: String,
    /// Event time in epoch milliseconds.
    pub timestamp_ms: i64,
}

/// One persisted point of the dot series.
#[derive(Debug, Clone)]
pub struct DotRecord {
    /// Bucket start in epoch seconds, always period-aligned.
    pub timestamp: i64,
    pub state: String,
}

/// Outcome of an idempotent insert. `AlreadyExists` is not an error: it is
/// how overlapping backfill/live invocations converge on one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
}

/// Read access to classified events and their sentiment labels.
pub trait LabelStore: Send + Sync {
    /// Events with `start_ms <= timestamp < end_ms` for the given analyst.
    fn events_in_range(
        &self,
        analyst: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<SentimentEvent>, StoreError>;

    /// Label for a single event, `None` if the classifier never produced one.
    fn lookup_label(&self, post_hash: &str, analyst: &str) -> Result<Option<String>, StoreError>;

    fn min_event_timestamp(&self, analyst: &str) -> Result<Option<i64>, StoreError>;

    fn max_event_timestamp(&self, analyst: &str) -> Result<Option<i64>, StoreError>;
}

/// Append-only persistence for the dot series. Records are write-once:
/// there is no update or delete in this interface by design.
pub trait DotStore: Send + Sync {
    fn latest(&self, version: DotVersion) -> Result<Option<DotRecord>, StoreError>;

    fn get(&self, version: DotVersion, timestamp: i64) -> Result<Option<String>, StoreError>;

    fn insert_if_absent(
        &self,
        version: DotVersion,
        timestamp: i64,
        state: &str,
    ) -> Result<InsertOutcome, StoreError>;

    /// All persisted bucket timestamps for a version, ascending.
    fn timestamps(&self, version: DotVersion) -> Result<Vec<i64>, StoreError>;
}

/// Wall-clock capability, injectable so catch-up logic is testable without
/// real elapsed time.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Settable clock for deterministic tests.
pub struct ManualClock {
    now_ms: std::sync::atomic::AtomicI64,
}

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self {
            now_ms: std::sync::atomic::AtomicI64::new(now_ms),
        }
    }

    pub fn set_ms(&self, now_ms: i64) {
        self.now_ms
            .store(now_ms, std::sync::atomic::Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(std::sync::atomic::Ordering::SeqCst)
    }
}

/// Periodic wake-up for the live loop.
#[async_trait]
pub trait Ticker: Send {
    /// Completes when the next tick is due. Returns `false` when the ticker
    /// is exhausted (manual tickers only; the interval ticker never is).
    async fn tick(&mut self) -> bool;
}

pub struct IntervalTicker {
    inner: tokio::time::Interval,
}

impl IntervalTicker {
    pub fn new(period: std::time::Duration) -> Self {
        let mut inner = tokio::time::interval(period);
        inner.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        Self { inner }
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) -> bool {
        self.inner.tick().await;
        true
    }
}

/// Test ticker that fires a fixed number of times, then reports exhaustion.
pub struct ManualTicker {
    remaining: u32,
}

impl ManualTicker {
    pub fn new(ticks: u32) -> Self {
        Self { remaining: ticks }
    }
}

#[async_trait]
impl Ticker for ManualTicker {
    async fn tick(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}
