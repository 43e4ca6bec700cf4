//! Data ingestion and normalization for the RTM sentiment pipeline.
//!
//! This crate handles:
//! - Raw provider batches with arbitrary column names
//! - Semantic column detection and cell coercion
//! - Hourly mean aggregation of price and load frames
//! - Price/load assembly with per-zone load forward fill
//! - Prioritized fetch strategies

pub mod raw;
pub mod columns;
pub mod coerce;
pub mod frame;
pub mod assemble;
pub mod source;

pub use raw::RawBatch;
pub use columns::{detect_column, ColumnMap};
pub use frame::{normalize_loads, normalize_prices, FrameNormalizer, NormalizedFrame};
pub use assemble::{assemble, forward_fill_load};
pub use source::{fetch_with_fallback, BatchSource, FetchWindow, JsonFileSource};
