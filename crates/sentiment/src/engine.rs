//! Sentiment computation engine.
//!
//! Walks a canonical table zone by zone in time order, keeping one price
//! window and one load window per zone, and enriches every row with its
//! baselines, sub-scores, combined sentiment and bucket.

use crate::scoring::{combine, load_pct_deviation, pct_to_score, robust_z_score, z_to_score};
use crate::window::RollingWindow;
use rtm_core::config::{SentimentConfig, SentimentWeights};
use rtm_core::{CanonicalRecord, EnrichedRecord, EnrichedTable, SentimentBucket, Zone};
use std::collections::HashMap;

/// Rolling state for one zone.
struct ZoneWindows {
    price: RollingWindow,
    load: RollingWindow,
}

impl ZoneWindows {
    fn new(window: usize, min_periods: usize) -> Self {
        Self {
            price: RollingWindow::new(window, min_periods),
            load: RollingWindow::new(window, min_periods),
        }
    }
}

/// Sentiment engine with an immutable configuration.
#[derive(Debug, Clone)]
pub struct SentimentEngine {
    window: usize,
    min_periods: usize,
    /// Normalized weights.
    weights: SentimentWeights,
}

impl SentimentEngine {
    /// Create an engine from configuration.
    pub fn new(config: &SentimentConfig) -> Self {
        Self::with_params(
            config.window_hours as usize,
            config.min_periods as usize,
            config.weights,
        )
    }

    /// Create an engine from explicit parameters. Weights are normalized here.
    pub fn with_params(window_hours: usize, min_periods: usize, weights: SentimentWeights) -> Self {
        Self {
            window: window_hours,
            min_periods,
            weights: weights.normalized(),
        }
    }

    /// The normalized weights in use.
    pub fn weights(&self) -> SentimentWeights {
        self.weights
    }

    /// Score a canonical table.
    ///
    /// Output is sorted by (zone, timestamp) and has one row per input row.
    /// Rows without enough history still get a score (it drifts to the
    /// midpoint because undefined deviations count as zero).
    pub fn score(&self, table: &[CanonicalRecord]) -> EnrichedTable {
        let mut rows: Vec<&CanonicalRecord> = table.iter().collect();
        rows.sort_by_key(|record| record.key());

        let mut windows: HashMap<Zone, ZoneWindows> = HashMap::new();
        let enriched: EnrichedTable = rows
            .into_iter()
            .map(|record| {
                let zone_windows = windows
                    .entry(record.zone)
                    .or_insert_with(|| ZoneWindows::new(self.window, self.min_periods));
                self.score_row(record, zone_windows)
            })
            .collect();

        tracing::debug!(
            rows = enriched.len(),
            zones = windows.len(),
            window = self.window,
            min_periods = self.min_periods,
            "scored table"
        );

        enriched
    }

    fn score_row(&self, record: &CanonicalRecord, windows: &mut ZoneWindows) -> EnrichedRecord {
        windows.price.push(record.price);
        let price_baseline = windows.price.median();
        let price_mad = windows.price.mad();
        let price_z = robust_z_score(record.price, price_baseline, price_mad);
        let price_score = z_to_score(price_z);

        windows.load.push(record.system_load);
        let load_baseline = windows.load.mean();
        let load_pct_dev = load_pct_deviation(record.system_load, load_baseline);
        let load_score = pct_to_score(load_pct_dev);

        let sentiment = combine(price_score, load_score, &self.weights);

        EnrichedRecord {
            record: record.clone(),
            price_baseline,
            price_mad,
            price_z,
            price_score,
            load_baseline,
            load_pct_dev,
            load_score,
            sentiment,
            sentiment_bucket: SentimentBucket::from_score(sentiment),
        }
    }
}

/// Score a table with explicit parameters.
pub fn score_table(
    table: &[CanonicalRecord],
    window_hours: usize,
    min_periods: usize,
    weights: SentimentWeights,
) -> EnrichedTable {
    SentimentEngine::with_params(window_hours, min_periods, weights).score(table)
}
