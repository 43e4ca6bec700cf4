//! One collection cycle: merge fresh rows into the stored table, rescore and persist.

use crate::dataset::DatasetStore;
use crate::merge::merge;
use rtm_core::{CanonicalRecord, EnrichedTable, Result};
use rtm_sentiment::SentimentEngine;

/// Outcome of a collection cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Rows in the fresh batch.
    pub fetched: usize,
    /// Rows persisted before the cycle.
    pub existing: usize,
    /// Rows persisted after the cycle.
    pub combined: usize,
    pub table: EnrichedTable,
}

/// Merge `fresh` into the stored dataset, rescore every zone, and persist.
///
/// The read-merge-score-write sequence runs inside a single write
/// transaction. An empty batch leaves the dataset untouched.
pub fn collect_and_update(
    store: &mut DatasetStore,
    fresh: &[CanonicalRecord],
    engine: &SentimentEngine,
) -> Result<CycleReport> {
    if fresh.is_empty() {
        tracing::warn!("no fresh rows collected, keeping existing dataset");
        let table = store.load()?;
        return Ok(CycleReport {
            fetched: 0,
            existing: table.len(),
            combined: table.len(),
            table,
        });
    }

    let mut existing_rows = 0;
    let table = store.update_with(|stored| {
        existing_rows = stored.len();
        let canonical: Vec<CanonicalRecord> = stored.into_iter().map(|r| r.record).collect();
        let merged = merge(&canonical, fresh);
        Ok(engine.score(&merged))
    })?;

    tracing::info!(
        fetched = fresh.len(),
        existing = existing_rows,
        combined = table.len(),
        "collection cycle complete"
    );

    Ok(CycleReport {
        fetched: fresh.len(),
        existing: existing_rows,
        combined: table.len(),
        table,
    })
}
