//! Scalar value model for primary-key material and cached rows.
//!
//! Literals and resolved bind variables arrive from the query planner as
//! dynamically typed values. `Value` is the tagged variant that carries them
//! through key derivation and row payloads; `ColumnType` is the declared type
//! tag a value is checked against. The comparison is total and coercion-free:
//! an integer is never silently accepted for a text column, and a float is
//! never accepted for an integer column (or the reverse), because the backend
//! would coerce such values while the cache would hash them differently.

use serde::{Deserialize, Serialize};

use crate::errors::{CacheError, Result};

/// Declared scalar type of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Int,
    Float,
    Text,
    Bytes,
}

impl ColumnType {
    /// Human-readable name, used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::Text => "text",
            ColumnType::Bytes => "bytes",
        }
    }
}

/// A dynamically typed scalar supplied by the planner as key material or
/// stored inside a cached row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl Value {
    /// Human-readable kind name, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
        }
    }

    /// Returns true when this value's runtime kind agrees exactly with the
    /// declared column type. Null never matches: primary-key components are
    /// non-nullable by construction.
    pub fn matches_type(&self, column_type: ColumnType) -> bool {
        matches!(
            (self, column_type),
            (Value::Int(_), ColumnType::Int)
                | (Value::Float(_), ColumnType::Float)
                | (Value::Text(_), ColumnType::Text)
                | (Value::Bytes(_), ColumnType::Bytes)
        )
    }
}

/// A cached row: values ordered by the table's column list.
///
/// Rows are serialized to an opaque payload for storage; the cache never
/// inspects payload contents beyond equality during spot checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Serializes the row into an opaque cache payload.
    pub fn to_payload(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(CacheError::from)
    }

    /// Deserializes a row from a cache payload.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        serde_json::from_slice(payload).map_err(CacheError::from)
    }
}
