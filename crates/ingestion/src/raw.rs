//! Raw tabular batches as delivered by a provider.
//!
//! Column names are whatever the provider chose; cells are untyped JSON values.

use rtm_core::{Error, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A batch of rows with provider-chosen column names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBatch {
    /// Column names, in batch order.
    columns: Vec<String>,
    /// Row-major cells; every row has `columns.len()` entries.
    rows: Vec<Vec<Value>>,
}

impl RawBatch {
    /// Build a batch from explicit columns and rows.
    ///
    /// Short rows are padded with nulls, long rows are truncated.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Value::Null);
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Build a batch from records (one JSON object per row).
    ///
    /// Columns are the union of all keys, ordered by the first record that
    /// carries each one (within a record, keys come in `serde_json::Map`
    /// order, which is sorted). Keys missing from a record become nulls.
    pub fn from_records(records: Vec<Map<String, Value>>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for record in &records {
            for key in record.keys() {
                if !index.contains_key(key) {
                    index.insert(key.clone(), columns.len());
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .into_iter()
            .map(|record| {
                let mut row = vec![Value::Null; columns.len()];
                for (key, value) in record {
                    if let Some(&i) = index.get(&key) {
                        row[i] = value;
                    }
                }
                row
            })
            .collect();

        Self { columns, rows }
    }

    /// Parse a JSON array of objects.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        match value {
            Value::Array(items) => {
                let mut records = Vec::with_capacity(items.len());
                for (i, item) in items.into_iter().enumerate() {
                    match item {
                        Value::Object(map) => records.push(map),
                        other => {
                            return Err(Error::data(format!(
                                "raw batch row {i} is not an object: {other}"
                            )))
                        }
                    }
                }
                Ok(Self::from_records(records))
            }
            _ => Err(Error::data("raw batch must be a JSON array of objects")),
        }
    }

    /// Column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows.
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}
