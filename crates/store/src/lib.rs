//! Persistence and query layer for the RTM sentiment pipeline.
//!
//! This crate handles:
//! - Append-and-dedupe merging of fresh canonical rows
//! - The SQLite-backed enriched dataset
//! - Collection cycles (merge, rescore, persist)
//! - Latest/history reads over a persisted snapshot

pub mod merge;
pub mod dataset;
pub mod pipeline;
pub mod query;

pub use merge::merge;
pub use dataset::DatasetStore;
pub use pipeline::{collect_and_update, CycleReport};
pub use query::DatasetQuery;
