//! Read-only audit of the persisted series invariants
//!
//! Scans every record of one version in ascending order and checks
//! alignment plus one-period contiguity. Stops at the first violation and
//! reports it; never repairs.

use super::aggregator::DotVersion;
use super::bucket::TimeBucketer;
use super::error::DotError;
use crate::store::DotStore;

#[derive(Debug, PartialEq, Eq)]
pub struct ValidationReport {
    pub records: u64,
}

pub struct Validator<'a> {
    dots: &'a dyn DotStore,
    version: DotVersion,
}

impl<'a> Validator<'a> {
    pub fn new(dots: &'a dyn DotStore, version: DotVersion) -> Self {
        Self { dots, version }
    }

    pub fn validate(&self) -> Result<ValidationReport, DotError> {
        let period = self.version.new_empty().period_secs();
        let bucketer = TimeBucketer::new(period);

        let timestamps = self.dots.timestamps(self.version)?;

        let mut prev: Option<i64> = None;
        for timestamp in &timestamps {
            bucketer.assert_aligned(*timestamp)?;
            if let Some(prev) = prev {
                bucketer.assert_contiguous(prev, *timestamp)?;
            }
            log::debug!("validated {}", timestamp);
            prev = Some(*timestamp);
        }

        log::info!(
            "✅ timestamp validation complete: {} records",
            timestamps.len()
        );
        Ok(ValidationReport {
            records: timestamps.len() as u64,
        })
    }
}
