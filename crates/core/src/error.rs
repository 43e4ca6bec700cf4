//! Error types for the RTM sentiment pipeline.

use crate::types::{FrameKind, SemanticRole};
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the RTM sentiment pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// A raw batch lacks a column for one or more required roles.
    #[error("Schema error: {kind} frame is missing columns for {}", join_roles(.missing))]
    Schema {
        kind: FrameKind,
        missing: Vec<SemanticRole>,
    },

    /// Unknown zone, or a zone with no persisted rows.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Query parameters outside the allowed range.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data error (persisted data violating an invariant).
    #[error("Data error: {0}")]
    Data(String),

    /// Every fetch strategy failed.
    #[error("Source error: {0}")]
    Source(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

fn join_roles(roles: &[SemanticRole]) -> String {
    roles
        .iter()
        .map(|role| role.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Create a schema error.
    pub fn schema(kind: FrameKind, missing: Vec<SemanticRole>) -> Self {
        Error::Schema { kind, missing }
    }

    /// Create a not-found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Create an invalid query error.
    pub fn invalid_query(msg: impl Into<String>) -> Self {
        Error::InvalidQuery(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }

    /// Create a source error.
    pub fn source_failed(msg: impl Into<String>) -> Self {
        Error::Source(msg.into())
    }

    /// Create a database error.
    pub fn database(msg: impl Into<String>) -> Self {
        Error::Database(msg.into())
    }

    /// Is this a schema error?
    pub fn is_schema(&self) -> bool {
        matches!(self, Error::Schema { .. })
    }

    /// Is this a not-found error?
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
