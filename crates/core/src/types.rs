//! Core data types for the RTM sentiment pipeline.

use crate::error::{Error, Result};
use crate::zone::Zone;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Instant in the reference timezone (UTC).
pub type Timestamp = DateTime<Utc>;

/// Seconds in one hour.
pub const SECONDS_PER_HOUR: i64 = 3_600;

/// Sentiment at or above this is green.
pub const GREEN_THRESHOLD: f64 = 70.0;

/// Sentiment at or above this (and below green) is yellow.
pub const YELLOW_THRESHOLD: f64 = 40.0;

/// Truncate a timestamp down to the start of its hour.
#[inline]
pub fn truncate_to_hour(ts: Timestamp) -> Timestamp {
    let secs = ts.timestamp();
    let floored = secs - secs.rem_euclid(SECONDS_PER_HOUR);
    DateTime::from_timestamp(floored, 0).unwrap_or(ts)
}

/// Check that minute, second and sub-second components are all zero.
#[inline]
pub fn is_hour_aligned(ts: Timestamp) -> bool {
    ts.timestamp().rem_euclid(SECONDS_PER_HOUR) == 0 && ts.timestamp_subsec_nanos() == 0
}

/// Semantic role a raw column can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticRole {
    Timestamp,
    Location,
    Price,
    Load,
}

impl fmt::Display for SemanticRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticRole::Timestamp => write!(f, "timestamp"),
            SemanticRole::Location => write!(f, "location"),
            SemanticRole::Price => write!(f, "price"),
            SemanticRole::Load => write!(f, "load"),
        }
    }
}

/// Declared kind of a raw batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    /// Per-zone settlement prices.
    Price,
    /// System-wide demand, zone independent.
    Load,
}

impl FrameKind {
    /// Roles that must be present for a batch of this kind.
    pub fn required_roles(self) -> &'static [SemanticRole] {
        match self {
            FrameKind::Price => &[
                SemanticRole::Timestamp,
                SemanticRole::Location,
                SemanticRole::Price,
            ],
            FrameKind::Load => &[SemanticRole::Timestamp, SemanticRole::Load],
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameKind::Price => write!(f, "price"),
            FrameKind::Load => write!(f, "load"),
        }
    }
}

/// Hourly mean price for one zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub zone: Zone,
    /// Hour boundary.
    pub timestamp: Timestamp,
    pub price: f64,
}

/// Hourly mean system load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadPoint {
    /// Hour boundary.
    pub timestamp: Timestamp,
    pub system_load: f64,
}

/// One zone's observation for one hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Hour boundary (UTC).
    pub timestamp: Timestamp,
    /// Canonical zone.
    pub zone: Zone,
    /// Settlement price; absent for load-only data.
    pub price: Option<f64>,
    /// System demand.
    pub system_load: Option<f64>,
}

impl CanonicalRecord {
    /// Dedupe/sort key.
    #[inline]
    pub fn key(&self) -> (Zone, Timestamp) {
        (self.zone, self.timestamp)
    }
}

/// Canonical table: unique by key, sorted by (zone, timestamp).
pub type CanonicalTable = Vec<CanonicalRecord>;

/// Qualitative sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentBucket {
    Red,
    Yellow,
    Green,
}

impl SentimentBucket {
    /// Classify a sentiment value with the fixed thresholds.
    pub fn from_score(sentiment: f64) -> Self {
        if sentiment >= GREEN_THRESHOLD {
            SentimentBucket::Green
        } else if sentiment >= YELLOW_THRESHOLD {
            SentimentBucket::Yellow
        } else {
            SentimentBucket::Red
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SentimentBucket::Red => "red",
            SentimentBucket::Yellow => "yellow",
            SentimentBucket::Green => "green",
        }
    }
}

impl fmt::Display for SentimentBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentBucket {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "red" => Ok(SentimentBucket::Red),
            "yellow" => Ok(SentimentBucket::Yellow),
            "green" => Ok(SentimentBucket::Green),
            other => Err(Error::data(format!("unknown sentiment bucket: '{other}'"))),
        }
    }
}

/// A canonical record with its rolling baselines and scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub record: CanonicalRecord,
    /// Rolling median price (None until `min_periods` observations).
    pub price_baseline: Option<f64>,
    /// Rolling median absolute deviation of price.
    pub price_mad: Option<f64>,
    /// Robust z-score (0 when undefined).
    pub price_z: f64,
    pub price_score: f64,
    /// Rolling mean load.
    pub load_baseline: Option<f64>,
    /// Fractional deviation from the load baseline (0 when undefined).
    pub load_pct_dev: f64,
    pub load_score: f64,
    /// Combined score in [0, 100].
    pub sentiment: f64,
    pub sentiment_bucket: SentimentBucket,
}

impl EnrichedRecord {
    #[inline]
    pub fn key(&self) -> (Zone, Timestamp) {
        self.record.key()
    }
}

/// Enriched table, sorted by (zone, timestamp).
pub type EnrichedTable = Vec<EnrichedRecord>;
