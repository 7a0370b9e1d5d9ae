//! Dot Core - Incremental Sentiment Convergence Engine
//!
//! Derives the "dot" series, one bounded scalar per minute bucket, from the
//! stream of per-event sentiment labels.
//!
//! # Architecture
//!
//! ```text
//! Label Store → fetch_bucket_labels → DotAggregator (v1 | v2)
//!     ↓                                    ↓
//! BackfillRunner (historical, up to now - 30m)
//!     ↓
//! LiveProcessor (one tick per bucket, catch-up toward real time)
//!     ↓
//! Dot Store (write-once records) ← Validator (alignment + contiguity audit)
//! ```
//!
//! All timestamps inside the engine are epoch seconds and period-aligned;
//! the bucketer's assertions enforce that at every boundary. Persistence is
//! insert-if-absent only, which is what makes restarts and overlapping
//! invocations safe.

pub mod aggregator;
pub mod backfill;
pub mod bucket;
pub mod dot_v1;
pub mod dot_v2;
pub mod error;
pub mod labels;
pub mod live;
pub mod validate;

pub use aggregator::{DotAggregator, DotVersion, LabeledSentiment};
pub use backfill::{BackfillRunner, BackfillSummary, DEFAULT_HORIZON_SECS};
pub use bucket::TimeBucketer;
pub use dot_v1::DotV1;
pub use dot_v2::DotV2;
pub use error::DotError;
pub use live::{LiveProcessor, TickSummary, DEFAULT_CATCHUP_THRESHOLD_SECS};
pub use validate::{ValidationReport, Validator};
