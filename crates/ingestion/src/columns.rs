//! Semantic column detection.
//!
//! Each role has an ordered list of raw column names seen from providers.
//! The first candidate present in a batch wins; nothing is guessed.

use crate::raw::RawBatch;
use rtm_core::{Error, FrameKind, Result, SemanticRole};

/// Columns that may hold the observation time.
pub const TIMESTAMP_CANDIDATES: &[&str] = &[
    "timestamp",
    "time",
    "datetime",
    "Delivery Interval",
    "Delivery Interval Ending",
    "Interval Ending",
    "Oper Interval",
    "Settlement Point Price Date",
    "Settlement Point Price Timestamp",
];

/// Columns that may hold a settlement point or zone name.
pub const LOCATION_CANDIDATES: &[&str] = &[
    "location",
    "Location",
    "Settlement Point",
    "settlement_point",
    "Load Zone",
    "SettlementPoint",
];

/// Columns that may hold a real-time price.
pub const PRICE_CANDIDATES: &[&str] = &[
    "lmp",
    "price",
    "Price",
    "Settlement Point Price",
    "Settlement Point Price ($/MWH)",
    "SettlementPointPrice",
];

/// Columns that may hold system load.
pub const LOAD_CANDIDATES: &[&str] = &[
    "System Load",
    "Actual System Load",
    "Actual Load",
    "Load",
    "Actual Load (MW)",
    "actual_load",
];

/// Candidate names for a role, in priority order.
pub fn candidates(role: SemanticRole) -> &'static [&'static str] {
    match role {
        SemanticRole::Timestamp => TIMESTAMP_CANDIDATES,
        SemanticRole::Location => LOCATION_CANDIDATES,
        SemanticRole::Price => PRICE_CANDIDATES,
        SemanticRole::Load => LOAD_CANDIDATES,
    }
}

/// Find the column index for a role.
pub fn detect_column(batch: &RawBatch, role: SemanticRole) -> Option<usize> {
    candidates(role)
        .iter()
        .find_map(|name| batch.column_index(name))
}

/// Resolved column indices for one frame kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub timestamp: usize,
    /// Present for price frames.
    pub location: Option<usize>,
    /// Price column (price frames) or load column (load frames).
    pub value: usize,
}

impl ColumnMap {
    /// Detect every required role for `kind`, or fail naming all missing roles.
    pub fn detect(batch: &RawBatch, kind: FrameKind) -> Result<Self> {
        let mut timestamp = None;
        let mut location = None;
        let mut value = None;
        let mut missing = Vec::new();

        for &role in kind.required_roles() {
            let Some(index) = detect_column(batch, role) else {
                missing.push(role);
                continue;
            };
            match role {
                SemanticRole::Timestamp => timestamp = Some(index),
                SemanticRole::Location => location = Some(index),
                SemanticRole::Price | SemanticRole::Load => value = Some(index),
            }
        }

        match (timestamp, value) {
            (Some(timestamp), Some(value)) if missing.is_empty() => Ok(Self {
                timestamp,
                location,
                value,
            }),
            _ => Err(Error::schema(kind, missing)),
        }
    }
}
