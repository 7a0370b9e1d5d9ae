//! Dot v1: single-scalar convergence tracker

use super::aggregator::{label_proportions, limit_dot, DotAggregator, DotVersion, LabeledSentiment};
use super::error::DotError;
use serde::{Deserialize, Serialize};

/// Proportion a single label must exceed for the bucket to count as
/// converging. Tweaking this collapses the series to either end of the
/// spectrum: too high and nothing ever breaches it, too low and some label
/// wins every bucket.
const CONVERGENCE_THRESHOLD: f64 = 0.405;

/// Per-bucket step size, both directions.
const EPSILON: f64 = 0.005;

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct DotV1State {
    d: f64,
}

#[derive(Debug, Clone)]
pub struct DotV1 {
    d: f64,
}

impl DotV1 {
    pub fn new_empty() -> Self {
        Self { d: 0.0 }
    }

    pub fn restore(serialized: &str) -> Result<Self, DotError> {
        let state: DotV1State =
            serde_json::from_str(serialized).map_err(|e| DotError::Schema(e.to_string()))?;
        Ok(Self {
            d: limit_dot(state.d),
        })
    }
}

impl DotAggregator for DotV1 {
    fn version(&self) -> DotVersion {
        DotVersion::V1
    }

    fn period_secs(&self) -> i64 {
        60
    }

    fn value(&self) -> f64 {
        self.d
    }

    fn forward(&mut self, events: &[LabeledSentiment]) {
        let proportions = label_proportions(events);

        for proportion in proportions.values() {
            if *proportion > CONVERGENCE_THRESHOLD {
                // Some label is winning the bucket: the network is converging
                self.d = limit_dot(self.d + EPSILON);
                return;
            }
        }

        // No convergence
        self.d = limit_dot(self.d - EPSILON);
    }

    fn serialize(&self) -> String {
        // d is always finite and clamped, encoding cannot fail
        serde_json::to_string(&DotV1State { d: self.d }).unwrap()
    }
}
