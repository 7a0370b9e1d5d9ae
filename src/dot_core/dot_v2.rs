//! Dot v2: canonical-category convergence with a bounded sentiment history
//!
//! The formula only looks at the current bucket's positive/negative/neutral
//! proportions; the 40-entry history buffer is still populated and persisted
//! on every step so downstream versions can pick it up, and it backs the
//! `last_winning_sentiment` debug view.

use super::aggregator::{label_proportions, limit_dot, DotAggregator, DotVersion, LabeledSentiment};
use super::error::DotError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::VecDeque;

/// History buffer capacity; oldest entries are evicted first.
const HISTORY_SIZE: usize = 40;

/// Buffer entries older than this are ignored by `last_winning_sentiment`.
const WINNING_WINDOW_SECS: i64 = 20 * 60;

const EPSILON_INCREASE: f64 = 0.06;
const EPSILON_DECREASE: f64 = 0.009;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct HistoryEntry {
    /// Source event time, epoch seconds.
    t: i64,
    /// Label string as produced by the classifier.
    v: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct DotV2State {
    d: f64,
    s: Vec<HistoryEntry>,
}

#[derive(Debug, Clone)]
pub struct DotV2 {
    d: f64,
    history: VecDeque<HistoryEntry>,
}

impl DotV2 {
    pub fn new_empty() -> Self {
        Self {
            d: 0.0,
            history: VecDeque::with_capacity(HISTORY_SIZE),
        }
    }

    pub fn restore(serialized: &str) -> Result<Self, DotError> {
        let mut state: DotV2State =
            serde_json::from_str(serialized).map_err(|e| DotError::Schema(e.to_string()))?;
        state.s.truncate(HISTORY_SIZE);
        Ok(Self {
            d: limit_dot(state.d),
            history: state.s.into(),
        })
    }

    fn push_history(&mut self, entry: HistoryEntry) {
        if self.history.len() >= HISTORY_SIZE {
            self.history.pop_front();
        }
        self.history.push_back(entry);
    }

    /// Majority label among buffer entries from the last 20 minutes, if any.
    pub fn last_winning_sentiment(&self, now_secs: i64) -> Option<String> {
        let mut win_counter: HashMap<&str, u32> = HashMap::new();
        for entry in &self.history {
            if now_secs - entry.t > WINNING_WINDOW_SECS {
                continue;
            }
            *win_counter.entry(entry.v.as_str()).or_insert(0) += 1;
        }

        win_counter
            .into_iter()
            .max_by_key(|(_, count)| *count)
            .map(|(label, _)| label.to_string())
    }
}

impl DotAggregator for DotV2 {
    fn version(&self) -> DotVersion {
        DotVersion::V2
    }

    fn period_secs(&self) -> i64 {
        60
    }

    fn value(&self) -> f64 {
        self.d
    }

    fn forward(&mut self, events: &[LabeledSentiment]) {
        for event in events {
            self.push_history(HistoryEntry {
                t: event.timestamp,
                v: event.label.clone(),
            });
        }

        let proportions = label_proportions(events);
        let emotional = proportions.get("positive").copied().unwrap_or(0.0)
            + proportions.get("negative").copied().unwrap_or(0.0);
        let neutral = proportions.get("neutral").copied().unwrap_or(0.0);

        // Ties take the decrease branch
        if emotional > neutral {
            self.d = limit_dot(self.d + EPSILON_INCREASE);
        } else {
            self.d = limit_dot(self.d - EPSILON_DECREASE);
        }
    }

    fn serialize(&self) -> String {
        let state = DotV2State {
            d: self.d,
            s: self.history.iter().cloned().collect(),
        };
        serde_json::to_string(&state).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(labels: &[(i64, &str)]) -> Vec<LabeledSentiment> {
        labels
            .iter()
            .map(|(timestamp, label)| LabeledSentiment {
                timestamp: *timestamp,
                label: label.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_emotional_majority_increases() {
        // positive + negative = 0.6 > neutral = 0.4
        let mut dot = DotV2::restore(r#"{"d":0.5,"s":[]}"#).unwrap();
        dot.forward(&bucket(&[
            (0, "positive"),
            (0, "positive"),
            (0, "negative"),
            (0, "neutral"),
            (0, "neutral"),
        ]));
        assert!((dot.value() - 0.56).abs() < 1e-12);
    }

    #[test]
    fn test_tie_takes_decrease_branch() {
        // positive = 0.5, neutral = 0.5: not strictly greater
        let mut dot = DotV2::new_empty();
        dot.forward(&bucket(&[(0, "positive"), (0, "neutral")]));
        assert_eq!(dot.value(), 0.0);
    }

    #[test]
    fn test_unknown_labels_ignored_by_formula() {
        // "other" contributes to neither side, so 0.5 > 0.0 holds
        let mut dot = DotV2::new_empty();
        dot.forward(&bucket(&[(0, "positive"), (0, "other")]));
        assert!((dot.value() - 0.06).abs() < 1e-12);
    }

    #[test]
    fn test_history_caps_at_forty() {
        let mut dot = DotV2::new_empty();
        let events: Vec<(i64, &str)> = (0..45).map(|i| (i as i64, "neutral")).collect();
        dot.forward(&bucket(&events));

        assert_eq!(dot.history.len(), 40);
        // Oldest five were evicted
        assert_eq!(dot.history.front().unwrap().t, 5);
        assert_eq!(dot.history.back().unwrap().t, 44);
    }

    #[test]
    fn test_serialize_round_trip_fixpoint() {
        let mut dot = DotV2::new_empty();
        dot.forward(&bucket(&[(100, "positive"), (110, "negative")]));

        let encoded = dot.serialize();
        let restored = DotV2::restore(&encoded).unwrap();
        assert_eq!(restored.serialize(), encoded);
    }

    #[test]
    fn test_restore_is_schema_strict() {
        assert!(matches!(
            DotV2::restore(r#"{"d":0.5}"#),
            Err(DotError::Schema(_))
        ));
        assert!(matches!(
            DotV2::restore(r#"{"d":0.5,"s":[],"x":1}"#),
            Err(DotError::Schema(_))
        ));
        assert!(matches!(
            DotV2::restore(r#"{"d":0.5,"s":[{"t":1}]}"#),
            Err(DotError::Schema(_))
        ));
    }

    #[test]
    fn test_restore_truncates_oversized_history() {
        let entries: Vec<String> = (0..50)
            .map(|i| format!(r#"{{"t":{},"v":"neutral"}}"#, i))
            .collect();
        let encoded = format!(r#"{{"d":0.5,"s":[{}]}}"#, entries.join(","));

        let dot = DotV2::restore(&encoded).unwrap();
        assert_eq!(dot.history.len(), 40);
        assert_eq!(dot.history.front().unwrap().t, 0);
    }

    #[test]
    fn test_last_winning_sentiment_windowed() {
        let mut dot = DotV2::new_empty();
        dot.forward(&bucket(&[
            (100, "negative"),
            (2000, "positive"),
            (2010, "positive"),
        ]));

        // At t=2100 everything is in the window, positive wins
        assert_eq!(
            dot.last_winning_sentiment(2100),
            Some("positive".to_string())
        );
        // Far in the future nothing qualifies
        assert_eq!(dot.last_winning_sentiment(100_000), None);
    }
}
