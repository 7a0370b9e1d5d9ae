//! Live catch-up loop: extend the persisted series toward near-real-time
//!
//! One tick per bucket period. Each tick resumes from the latest persisted
//! record and walks forward while a full bucket of source data is available,
//! enforcing contiguity the whole way. Backfill runs synchronously inside
//! this task when the gap is large, so the two writers are never active
//! against the same version at once.

use super::aggregator::DotVersion;
use super::backfill::{BackfillRunner, BackfillSummary};
use super::bucket::TimeBucketer;
use super::error::DotError;
use super::labels::fetch_bucket_labels;
use crate::store::{Clock, DotStore, InsertOutcome, LabelStore, Ticker};

/// Gap beyond which startup hands the catch-up to the backfill runner
/// instead of grinding through it bucket by bucket here.
pub const DEFAULT_CATCHUP_THRESHOLD_SECS: i64 = 30 * 60;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Buckets persisted this tick.
    pub processed: u64,
    /// Buckets persisted with repeat-last-value because no labels arrived.
    pub gap_alerts: u64,
}

pub struct LiveProcessor<'a> {
    labels: &'a dyn LabelStore,
    dots: &'a dyn DotStore,
    clock: &'a dyn Clock,
    version: DotVersion,
    analyst: String,
    catchup_threshold_secs: i64,
    backfill_horizon_secs: i64,
}

impl<'a> LiveProcessor<'a> {
    pub fn new(
        labels: &'a dyn LabelStore,
        dots: &'a dyn DotStore,
        clock: &'a dyn Clock,
        version: DotVersion,
        analyst: impl Into<String>,
        catchup_threshold_secs: i64,
        backfill_horizon_secs: i64,
    ) -> Self {
        Self {
            labels,
            dots,
            clock,
            version,
            analyst: analyst.into(),
            catchup_threshold_secs,
            backfill_horizon_secs,
        }
    }

    /// Run forever (until the ticker is exhausted, which only a test ticker
    /// is). Any returned error is fatal; partial progress is already
    /// persisted and safe to resume from.
    pub async fn run(&self, ticker: &mut dyn Ticker) -> Result<(), DotError> {
        self.catch_up_if_stale()?;

        log::info!("entering dot worker loop for {}", self.version);
        loop {
            if !ticker.tick().await {
                return Ok(());
            }
            self.run_tick()?;
        }
    }

    /// Startup check: a baseline record must exist, and a gap wider than
    /// the threshold is closed by a synchronous backfill before ticking.
    pub fn catch_up_if_stale(&self) -> Result<Option<BackfillSummary>, DotError> {
        let latest = self.dots.latest(self.version)?.ok_or(DotError::NoBaseline)?;

        let now_secs = self.clock.now_ms().div_euclid(1000);
        let gap = now_secs - latest.timestamp;
        if gap <= self.catchup_threshold_secs {
            log::info!("gap is {}s, no backfill needed", gap);
            return Ok(None);
        }

        log::info!("gap is {}s, backfilling before entering the loop", gap);
        let runner = BackfillRunner::new(
            self.labels,
            self.dots,
            self.clock,
            self.version,
            self.analyst.clone(),
            self.backfill_horizon_secs,
        );
        Ok(Some(runner.run()?))
    }

    /// One tick: walk buckets from the latest persisted record while the
    /// bucket's end stays within the available source data.
    pub fn run_tick(&self) -> Result<TickSummary, DotError> {
        let latest = self.dots.latest(self.version)?.ok_or(DotError::NoBaseline)?;

        let mut state = self.version.restore(&latest.state)?;
        let bucketer = TimeBucketer::new(state.period_secs());
        bucketer.assert_aligned(latest.timestamp)?;

        let max_event_secs = match self.labels.max_event_timestamp(&self.analyst)? {
            Some(ms) => ms.div_euclid(1000),
            None => return Ok(TickSummary::default()),
        };

        let mut summary = TickSummary::default();
        let mut prev = latest.timestamp;
        let mut bucket_start = latest.timestamp + bucketer.period_secs();

        while bucket_start + bucketer.period_secs() <= max_event_secs {
            bucketer.assert_contiguous(prev, bucket_start)?;
            let bucket_end = bucket_start + bucketer.period_secs();
            bucketer.assert_aligned(bucket_start)?;
            bucketer.assert_aligned(bucket_end)?;

            let events =
                fetch_bucket_labels(self.labels, &self.analyst, bucket_start, bucket_end)?;
            if events.is_empty() {
                // Empty buckets are expected during backfill but not here:
                // data exists past this bucket, so the classifier is lagging
                log::error!(
                    "no sentiments in live bucket {}, repeating last value (upstream lag?)",
                    bucket_start
                );
                summary.gap_alerts += 1;
            } else {
                state.forward(&events);
            }

            let outcome =
                self.dots
                    .insert_if_absent(self.version, bucket_start, &state.serialize())?;
            if outcome == InsertOutcome::Inserted {
                log::info!("dot {} = {:.3}", bucket_start, state.value());
            }
            summary.processed += 1;

            prev = bucket_start;
            bucket_start += bucketer.period_secs();
        }

        Ok(summary)
    }
}
