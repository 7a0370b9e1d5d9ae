//! Fixed-period time bucketing and the series invariants
//!
//! Every timestamp entering or leaving the engine is an epoch-second bucket
//! start and must be an exact multiple of the period. The two assertions
//! here are the only gate: anything that fails them is a scheduling or data
//! bug, not a recoverable condition.

use super::error::DotError;

const HOUR_SECS: i64 = 3600;

#[derive(Debug, Clone, Copy)]
pub struct TimeBucketer {
    period_secs: i64,
}

impl TimeBucketer {
    pub fn new(period_secs: i64) -> Self {
        assert!(period_secs > 0, "bucket period must be positive");
        Self { period_secs }
    }

    pub fn period_secs(&self) -> i64 {
        self.period_secs
    }

    /// Smallest bucket start >= `t`.
    pub fn align_to_next(&self, t: i64) -> i64 {
        let rem = t.rem_euclid(self.period_secs);
        if rem == 0 {
            t
        } else {
            t + (self.period_secs - rem)
        }
    }

    /// Smallest whole-hour boundary >= `t`. A fresh series always starts on
    /// an hour boundary, which is itself bucket-aligned for any period that
    /// divides 3600.
    pub fn align_to_next_hour(&self, t: i64) -> i64 {
        let rem = t.rem_euclid(HOUR_SECS);
        if rem == 0 {
            t
        } else {
            t + (HOUR_SECS - rem)
        }
    }

    pub fn assert_aligned(&self, t: i64) -> Result<(), DotError> {
        if t % self.period_secs != 0 {
            return Err(DotError::Alignment { timestamp: t });
        }
        Ok(())
    }

    pub fn assert_contiguous(&self, prev: i64, next: i64) -> Result<(), DotError> {
        let delta = next - prev;
        if delta != self.period_secs {
            return Err(DotError::Continuity { prev, next, delta });
        }
        Ok(())
    }

    /// Bucket starts with `start <= x <= end`, one period apart. `start`
    /// must already be aligned; `end` is a plain upper bound. Empty when
    /// `start > end`.
    pub fn buckets(&self, start: i64, end: i64) -> impl Iterator<Item = i64> {
        let period = self.period_secs;
        (0..)
            .map(move |i| start + i * period)
            .take_while(move |t| *t <= end)
    }
}
