//! Frame normalization.
//!
//! Turns a raw provider batch into canonical hourly points: detect columns,
//! coerce cells, drop incomplete rows, truncate to the hour and average
//! every (zone, hour) [price] or hour [load] group.

use crate::coerce::{coerce_number, coerce_timestamp, coerce_zone};
use crate::columns::ColumnMap;
use crate::raw::RawBatch;
use rtm_core::{truncate_to_hour, FrameKind, LoadPoint, PricePoint, Result, Timestamp, Zone};
use std::collections::BTreeMap;

/// Running sum for one group.
#[derive(Debug, Clone, Copy, Default)]
struct MeanInProgress {
    sum: f64,
    count: u32,
}

impl MeanInProgress {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

/// Arithmetic-mean reducer keyed by an ordered group key.
#[derive(Debug, Clone)]
struct HourlyMean<K: Ord> {
    groups: BTreeMap<K, MeanInProgress>,
}

impl<K: Ord> HourlyMean<K> {
    fn new() -> Self {
        Self {
            groups: BTreeMap::new(),
        }
    }

    fn add(&mut self, key: K, value: f64) {
        self.groups.entry(key).or_default().add(value);
    }

    /// Groups in key order with their means.
    fn finish(self) -> impl Iterator<Item = (K, f64)> {
        self.groups.into_iter().map(|(key, acc)| (key, acc.mean()))
    }
}

/// Output of a normalization pass.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedFrame {
    /// Unique by (zone, hour), sorted.
    Prices(Vec<PricePoint>),
    /// Unique by hour, sorted.
    Loads(Vec<LoadPoint>),
}

impl NormalizedFrame {
    pub fn len(&self) -> usize {
        match self {
            NormalizedFrame::Prices(points) => points.len(),
            NormalizedFrame::Loads(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Normalizer for one declared batch kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameNormalizer {
    kind: FrameKind,
}

impl FrameNormalizer {
    /// Create a normalizer for the given kind.
    pub fn new(kind: FrameKind) -> Self {
        Self { kind }
    }

    /// Price-frame normalizer.
    pub fn prices() -> Self {
        Self::new(FrameKind::Price)
    }

    /// Load-frame normalizer.
    pub fn loads() -> Self {
        Self::new(FrameKind::Load)
    }

    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    /// Normalize a batch of this normalizer's kind.
    ///
    /// Fails with a schema error if required columns are absent; never fails
    /// on individual malformed rows.
    pub fn normalize(&self, batch: &RawBatch) -> Result<NormalizedFrame> {
        match self.kind {
            FrameKind::Price => normalize_prices(batch).map(NormalizedFrame::Prices),
            FrameKind::Load => normalize_loads(batch).map(NormalizedFrame::Loads),
        }
    }

    fn parse_price_row(row: &[serde_json::Value], columns: &ColumnMap) -> Option<(Zone, Timestamp, f64)> {
        let timestamp = coerce_timestamp(&row[columns.timestamp])?;
        let zone = coerce_zone(&row[columns.location?])?;
        let price = coerce_number(&row[columns.value])?;
        Some((zone, truncate_to_hour(timestamp), price))
    }

    fn parse_load_row(row: &[serde_json::Value], columns: &ColumnMap) -> Option<(Timestamp, f64)> {
        let timestamp = coerce_timestamp(&row[columns.timestamp])?;
        let load = coerce_number(&row[columns.value])?;
        Some((truncate_to_hour(timestamp), load))
    }

    /// Hourly means per (zone, hour), plus the number of rows that survived coercion.
    fn aggregate_prices(batch: &RawBatch, columns: &ColumnMap) -> (Vec<PricePoint>, usize) {
        let mut means = HourlyMean::new();
        let mut kept = 0;
        for (zone, hour, price) in batch
            .rows()
            .iter()
            .filter_map(|row| Self::parse_price_row(row, columns))
        {
            means.add((zone, hour), price);
            kept += 1;
        }
        let points = means
            .finish()
            .map(|((zone, timestamp), price)| PricePoint {
                zone,
                timestamp,
                price,
            })
            .collect();
        (points, kept)
    }

    fn aggregate_loads(batch: &RawBatch, columns: &ColumnMap) -> (Vec<LoadPoint>, usize) {
        let mut means = HourlyMean::new();
        let mut kept = 0;
        for (hour, load) in batch
            .rows()
            .iter()
            .filter_map(|row| Self::parse_load_row(row, columns))
        {
            means.add(hour, load);
            kept += 1;
        }
        let points = means
            .finish()
            .map(|(timestamp, system_load)| LoadPoint {
                timestamp,
                system_load,
            })
            .collect();
        (points, kept)
    }
}

/// Normalize a price batch.
pub fn normalize_prices(batch: &RawBatch) -> Result<Vec<PricePoint>> {
    let columns = ColumnMap::detect(batch, FrameKind::Price)?;
    let (points, kept) = FrameNormalizer::aggregate_prices(batch, &columns);
    log_normalized(FrameKind::Price, batch.len(), kept, points.len());
    Ok(points)
}

/// Normalize a load batch.
pub fn normalize_loads(batch: &RawBatch) -> Result<Vec<LoadPoint>> {
    let columns = ColumnMap::detect(batch, FrameKind::Load)?;
    let (points, kept) = FrameNormalizer::aggregate_loads(batch, &columns);
    log_normalized(FrameKind::Load, batch.len(), kept, points.len());
    Ok(points)
}

fn log_normalized(kind: FrameKind, rows: usize, kept: usize, points: usize) {
    let dropped = rows - kept;
    if dropped > 0 {
        tracing::debug!(
            kind = %kind,
            dropped,
            total = rows,
            "dropped incomplete rows during normalization"
        );
    }
    tracing::debug!(kind = %kind, rows, points, "normalized frame");
}
