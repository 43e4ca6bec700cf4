//! Core types and configuration for the RTM sentiment pipeline.
//!
//! This crate provides shared types used across all other crates:
//! - Canonical zones and zone-name normalization
//! - Canonical and enriched hourly records
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;
pub mod zone;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;
pub use zone::{normalize_zone, Zone};
