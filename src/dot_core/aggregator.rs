//! Versioned dot aggregator contract
//!
//! Each version is a pure state machine: restore (or start empty), feed it
//! one bucket of labeled events at a time, serialize after every step. The
//! serialized form is schema-strict per version; adding a version means
//! adding a variant here, never branching on a version string in callers.

use super::dot_v1::DotV1;
use super::dot_v2::DotV2;
use super::error::DotError;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DotVersion {
    V1,
    V2,
}

impl DotVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            DotVersion::V1 => "v1",
            DotVersion::V2 => "v2",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "v1" => Some(DotVersion::V1),
            "v2" => Some(DotVersion::V2),
            _ => None,
        }
    }

    pub fn new_empty(&self) -> Box<dyn DotAggregator> {
        match self {
            DotVersion::V1 => Box::new(DotV1::new_empty()),
            DotVersion::V2 => Box::new(DotV2::new_empty()),
        }
    }

    /// Strict deserialization of a persisted state blob. Unknown or missing
    /// fields are a `SchemaError`; nothing is coerced.
    pub fn restore(&self, serialized: &str) -> Result<Box<dyn DotAggregator>, DotError> {
        match self {
            DotVersion::V1 => Ok(Box::new(DotV1::restore(serialized)?)),
            DotVersion::V2 => Ok(Box::new(DotV2::restore(serialized)?)),
        }
    }
}

impl std::fmt::Display for DotVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One labeled event inside a bucket. Timestamps are epoch seconds of the
/// source event, not of the bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledSentiment {
    pub timestamp: i64,
    pub label: String,
}

pub trait DotAggregator: Send {
    fn version(&self) -> DotVersion;

    /// Fixed bucket width in seconds.
    fn period_secs(&self) -> i64;

    /// Current dot value, always within [0, 1].
    fn value(&self) -> f64;

    /// Advance one bucket. Callers must not invoke this with an empty
    /// bucket; the repeat-last-value policy lives above this layer.
    fn forward(&mut self, events: &[LabeledSentiment]);

    /// Canonical JSON encoding of the current state.
    fn serialize(&self) -> String;
}

/// Clamp the dot scalar into [0, 1].
pub(crate) fn limit_dot(d: f64) -> f64 {
    d.clamp(0.0, 1.0)
}

/// Per-label share of the bucket's total label count.
pub(crate) fn label_proportions(events: &[LabeledSentiment]) -> HashMap<&str, f64> {
    let mut counters: HashMap<&str, u32> = HashMap::new();
    for event in events {
        *counters.entry(event.label.as_str()).or_insert(0) += 1;
    }

    let total = events.len() as f64;
    counters
        .into_iter()
        .map(|(label, count)| (label, count as f64 / total))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(label: &str) -> LabeledSentiment {
        LabeledSentiment {
            timestamp: 0,
            label: label.to_string(),
        }
    }

    #[test]
    fn test_label_proportions() {
        let events = vec![
            event("positive"),
            event("positive"),
            event("negative"),
            event("neutral"),
        ];
        let proportions = label_proportions(&events);
        assert_eq!(proportions["positive"], 0.5);
        assert_eq!(proportions["negative"], 0.25);
        assert_eq!(proportions["neutral"], 0.25);
    }

    #[test]
    fn test_version_round_trip() {
        for version in [DotVersion::V1, DotVersion::V2] {
            assert_eq!(DotVersion::from_str(version.as_str()), Some(version));
        }
        assert_eq!(DotVersion::from_str("v3"), None);
    }

    #[test]
    fn test_restore_dispatches_by_version() {
        let v1 = DotVersion::V1.restore(r#"{"d":0.25}"#).unwrap();
        assert_eq!(v1.version(), DotVersion::V1);
        assert_eq!(v1.value(), 0.25);

        let v2 = DotVersion::V2.restore(r#"{"d":0.25,"s":[]}"#).unwrap();
        assert_eq!(v2.version(), DotVersion::V2);
        assert_eq!(v2.value(), 0.25);
    }
}
