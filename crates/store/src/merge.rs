//! Append-and-dedupe merge.
//!
//! Incoming rows are logically appended after existing rows; on a
//! (zone, timestamp) conflict the later row wins. The result is sorted.

use rtm_core::{CanonicalRecord, CanonicalTable, Timestamp, Zone};
use std::collections::BTreeMap;

/// Merge a new batch into an existing table.
///
/// Idempotent: merging the same batch twice equals merging it once.
pub fn merge(existing: &[CanonicalRecord], incoming: &[CanonicalRecord]) -> CanonicalTable {
    let mut by_key: BTreeMap<(Zone, Timestamp), &CanonicalRecord> = BTreeMap::new();
    for record in existing.iter().chain(incoming) {
        by_key.insert(record.key(), record);
    }

    let merged: CanonicalTable = by_key.into_values().cloned().collect();
    tracing::debug!(
        existing = existing.len(),
        incoming = incoming.len(),
        merged = merged.len(),
        "merged batch"
    );
    merged
}
