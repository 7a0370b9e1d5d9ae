//! Bucket label collection shared by backfill and live catch-up

use super::aggregator::LabeledSentiment;
use super::error::DotError;
use crate::store::LabelStore;

/// Fetch the labeled events of one bucket, `[start, end)` in bucket seconds.
///
/// Events whose label was never produced by the classifier are logged and
/// skipped; that is upstream lag or loss, not a failure of this series.
pub fn fetch_bucket_labels(
    store: &dyn LabelStore,
    analyst: &str,
    bucket_start_secs: i64,
    bucket_end_secs: i64,
) -> Result<Vec<LabeledSentiment>, DotError> {
    let events = store.events_in_range(analyst, bucket_start_secs * 1000, bucket_end_secs * 1000)?;

    let mut labeled = Vec::with_capacity(events.len());
    for event in events {
        match store.lookup_label(&event.post_hash, analyst)? {
            Some(label) => labeled.push(LabeledSentiment {
                timestamp: event.timestamp_ms.div_euclid(1000),
                label,
            }),
            None => {
                log::warn!(
                    "no sentiment data found for event {}, skipping",
                    event.post_hash
                );
            }
        }
    }

    Ok(labeled)
}
