use std::collections::BTreeMap;

use crate::types::{PersonSeries, ResolvedRecord};

/// Fold resolved records into per-person send-event series.
///
/// Records with an unresolved sender are dropped. Per person the
/// timestamps are deduplicated, sorted ascending, and cut at the floor
/// instant; a person whose remaining count is at or below
/// `min_events_per_person` disappears from the output entirely.
pub fn build_series(
    resolved: &[ResolvedRecord],
    floor_epoch: i64,
    min_events_per_person: usize,
) -> BTreeMap<String, PersonSeries> {
    let mut by_sender: BTreeMap<&str, Vec<i64>> = BTreeMap::new();
    for r in resolved {
        if let Some(id) = &r.resolved_sender_id {
            by_sender.entry(id.as_str()).or_default().push(r.record.timestamp);
        }
    }

    let mut out = BTreeMap::new();
    for (id, mut timestamps) in by_sender {
        timestamps.sort_unstable();
        timestamps.dedup();
        timestamps.retain(|&t| t >= floor_epoch);

        let count = timestamps.len();
        if count <= min_events_per_person {
            continue;
        }
        out.insert(id.to_string(), PersonSeries { timestamps, count });
    }
    out
}
