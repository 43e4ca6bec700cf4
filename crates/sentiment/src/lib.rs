//! Sentiment scoring for the RTM sentiment pipeline.
//!
//! This crate handles:
//! - Trailing-window median, MAD and mean per zone
//! - Robust price z-scores and load percentage deviations
//! - Bounded sub-scores, weighted sentiment and buckets

pub mod window;
pub mod scoring;
pub mod engine;

pub use window::RollingWindow;
pub use engine::{score_table, SentimentEngine};
