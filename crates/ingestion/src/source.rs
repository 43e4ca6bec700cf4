//! Prioritized fetch strategies.
//!
//! A provider may expose the same data through several entry points. They are
//! tried in order; the first success wins and only the last failure is
//! surfaced when every strategy fails.

use crate::raw::RawBatch;
use chrono::Duration;
use rtm_core::{Error, Result, Timestamp};
use std::path::PathBuf;

/// Interval to fetch, in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl FetchWindow {
    /// The `lookback_hours` hours ending at `now`.
    pub fn trailing(lookback_hours: u32, now: Timestamp) -> Self {
        Self {
            start: now - Duration::hours(i64::from(lookback_hours)),
            end: now,
        }
    }

    /// Does the window contain `ts` (inclusive on both ends)?
    pub fn contains(&self, ts: Timestamp) -> bool {
        self.start <= ts && ts <= self.end
    }

    /// Does the hour starting at `hour` overlap the window?
    pub fn overlaps_hour(&self, hour: Timestamp) -> bool {
        hour + Duration::hours(1) > self.start && hour <= self.end
    }
}

/// One named way of obtaining a raw batch.
pub trait BatchSource {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Fetch raw rows covering `window`.
    fn fetch(&self, window: &FetchWindow) -> Result<RawBatch>;
}

/// Try each strategy in order and return the first batch obtained.
pub fn fetch_with_fallback(
    strategies: &[Box<dyn BatchSource>],
    window: &FetchWindow,
) -> Result<RawBatch> {
    let mut last_error: Option<Error> = None;

    for strategy in strategies {
        tracing::debug!(strategy = strategy.name(), "calling fetch strategy");
        match strategy.fetch(window) {
            Ok(batch) => {
                tracing::info!(strategy = strategy.name(), rows = batch.len(), "fetched batch");
                return Ok(batch);
            }
            Err(e) => {
                tracing::warn!(strategy = strategy.name(), error = %e, "fetch strategy failed");
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| Error::source_failed("no fetch strategies configured")))
}

/// Reads a records-oriented JSON file (an array of row objects).
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    name: String,
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: format!("json:{}", path.display()),
            path,
        }
    }
}

impl BatchSource for JsonFileSource {
    fn name(&self) -> &str {
        &self.name
    }

    /// The file is a snapshot; callers trim it to the window.
    fn fetch(&self, _window: &FetchWindow) -> Result<RawBatch> {
        let json = std::fs::read_to_string(&self.path)?;
        RawBatch::from_json_str(&json)
    }
}
