//! Configuration structures for the RTM sentiment pipeline.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sentiment scoring configuration.
    pub sentiment: SentimentConfig,
    /// Collection cycle configuration.
    pub collection: CollectionConfig,
    /// Read path configuration.
    pub query: QueryConfig,
}

impl Config {
    /// Parse a configuration from JSON. Missing sections use defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        self.sentiment.validate()?;
        self.query.validate()?;
        if self.collection.lookback_hours == 0 {
            return Err(Error::config("collection.lookback_hours must be positive"));
        }
        Ok(())
    }
}

/// Relative weights of the price and load sub-scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentWeights {
    pub price: f64,
    pub load: f64,
}

impl Default for SentimentWeights {
    fn default() -> Self {
        Self {
            price: 0.6,
            load: 0.4,
        }
    }
}

impl SentimentWeights {
    /// Scale the weights to sum to one, falling back to the default split
    /// when either weight is negative or non-finite, or both are zero.
    pub fn normalized(self) -> Self {
        let usable = |w: f64| w.is_finite() && w >= 0.0;
        let total = self.price + self.load;
        if !usable(self.price) || !usable(self.load) || !(total.is_finite() && total > 0.0) {
            return Self::default();
        }
        Self {
            price: self.price / total,
            load: self.load / total,
        }
    }
}

/// Rolling baseline and weighting configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    /// Rolling window length in observations (hourly rows).
    pub window_hours: u32,
    /// Observations required before a baseline is defined.
    pub min_periods: u32,
    /// Sub-score weights.
    pub weights: SentimentWeights,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            window_hours: 24 * 7,
            min_periods: 24,
            weights: SentimentWeights::default(),
        }
    }
}

impl SentimentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window_hours == 0 {
            return Err(Error::config("sentiment.window_hours must be positive"));
        }
        if self.min_periods > self.window_hours {
            return Err(Error::config(format!(
                "sentiment.min_periods ({}) exceeds window_hours ({})",
                self.min_periods, self.window_hours
            )));
        }
        let SentimentWeights { price, load } = self.weights;
        if !price.is_finite() || !load.is_finite() || price < 0.0 || load < 0.0 {
            return Err(Error::config(format!(
                "sentiment.weights must be finite and non-negative (price={price}, load={load})"
            )));
        }
        Ok(())
    }
}

/// Collection cycle configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// Hours in the past to refresh on each run.
    pub lookback_hours: u32,
    /// Persisted dataset location.
    pub dataset_path: PathBuf,
    /// How long an updater waits for another writer to finish.
    pub busy_timeout_secs: u64,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            lookback_hours: 48,
            dataset_path: PathBuf::from("data/rtm.sqlite3"),
            busy_timeout_secs: 30,
        }
    }
}

/// Read path configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Hours returned by `history` when the caller does not say.
    pub default_history_hours: u32,
    /// Upper bound on `history` lookback.
    pub max_history_hours: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_history_hours: 24,
            max_history_hours: 24 * 14,
        }
    }
}

impl QueryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_history_hours == 0 {
            return Err(Error::config("query.max_history_hours must be positive"));
        }
        if self.default_history_hours == 0 || self.default_history_hours > self.max_history_hours {
            return Err(Error::config(format!(
                "query.default_history_hours must be in 1..={}",
                self.max_history_hours
            )));
        }
        Ok(())
    }
}
