//! Historical catch-up: fill every bucket from the first known event up to
//! the safety horizon
//!
//! Backfill is idempotent end to end. Buckets that already hold a record
//! are skipped, and the in-memory aggregator is restored from the stored
//! state instead, so a resumed run continues the exact series the previous
//! run was writing. Empty buckets persist the unchanged prior state
//! (repeat-last-value); only alignment and storage failures abort.

use super::aggregator::{DotAggregator, DotVersion};
use super::bucket::TimeBucketer;
use super::error::DotError;
use super::labels::fetch_bucket_labels;
use crate::store::{Clock, DotStore, InsertOutcome, LabelStore};

/// How far behind "now" backfill stops. The live loop owns the final
/// stretch, so the two writers never race toward the same buckets.
pub const DEFAULT_HORIZON_SECS: i64 = 30 * 60;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct BackfillSummary {
    pub inserted: u64,
    pub skipped: u64,
}

pub struct BackfillRunner<'a> {
    labels: &'a dyn LabelStore,
    dots: &'a dyn DotStore,
    clock: &'a dyn Clock,
    version: DotVersion,
    analyst: String,
    horizon_secs: i64,
}

impl<'a> BackfillRunner<'a> {
    pub fn new(
        labels: &'a dyn LabelStore,
        dots: &'a dyn DotStore,
        clock: &'a dyn Clock,
        version: DotVersion,
        analyst: impl Into<String>,
        horizon_secs: i64,
    ) -> Self {
        Self {
            labels,
            dots,
            clock,
            version,
            analyst: analyst.into(),
            horizon_secs,
        }
    }

    pub fn run(&self) -> Result<BackfillSummary, DotError> {
        let now_secs = self.clock.now_ms().div_euclid(1000);

        let mut state: Box<dyn DotAggregator> = self.version.new_empty();
        let bucketer = TimeBucketer::new(state.period_secs());

        // A fresh series starts on the hour boundary after the first event;
        // with no events at all the range below is empty and the run is a no-op.
        let first_event_secs = self
            .labels
            .min_event_timestamp(&self.analyst)?
            .map(|ms| ms.div_euclid(1000))
            .unwrap_or(now_secs);
        let start = bucketer.align_to_next_hour(first_event_secs);
        let end = now_secs - self.horizon_secs;

        log::info!(
            "backfilling {} from {} to {} (now {})",
            self.version,
            start,
            end,
            now_secs
        );

        let mut summary = BackfillSummary::default();
        for bucket_start in bucketer.buckets(start, end) {
            let bucket_end = bucket_start + bucketer.period_secs();
            bucketer.assert_aligned(bucket_start)?;
            bucketer.assert_aligned(bucket_end)?;

            if let Some(existing) = self.dots.get(self.version, bucket_start)? {
                // Adopt the stored state so the walk continues the same
                // series a previous run was writing
                state = self.version.restore(&existing)?;
                summary.skipped += 1;
                log::debug!("dot data already exists at {}, skipping", bucket_start);
                continue;
            }

            let events = fetch_bucket_labels(self.labels, &self.analyst, bucket_start, bucket_end)?;
            if !events.is_empty() {
                state.forward(&events);
            }

            match self
                .dots
                .insert_if_absent(self.version, bucket_start, &state.serialize())?
            {
                InsertOutcome::Inserted => summary.inserted += 1,
                // A concurrent writer got there first; its value is the
                // same deterministic function of the same history
                InsertOutcome::AlreadyExists => summary.skipped += 1,
            }

            log::debug!(
                "backfilled bucket {} value {:.3}",
                bucket_start,
                state.value()
            );
        }

        log::info!(
            "✅ dot backfill complete: {} inserted, {} skipped",
            summary.inserted,
            summary.skipped
        );
        Ok(summary)
    }
}
