//! Test support: an in-memory `RowBackend` and fixture schema metadata.
//!
//! Used by this crate's unit and integration tests. Kept as a normal module
//! so downstream crates embedding the engine can reuse the fake backend in
//! their own tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use dashmap::DashMap;

use rowcache_commons::{BackendError, ColumnType, Row, TableName, Value};
use rowcache_schema::{ColumnDefinition, TableInfo};

use crate::backend::RowBackend;

/// In-memory backend with instrumented fetch counters.
///
/// Rows are keyed by the debug rendering of their primary-key tuple, which
/// is stable and collision-free for test fixtures.
pub struct MemoryBackend {
    rows: DashMap<TableName, HashMap<String, Row>>,
    fetch_calls: AtomicU64,
    keys_fetched: AtomicU64,
    unavailable: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
            fetch_calls: AtomicU64::new(0),
            keys_fetched: AtomicU64::new(0),
            unavailable: AtomicBool::new(false),
        }
    }

    fn pk_key(pk: &[Value]) -> String {
        format!("{:?}", pk)
    }

    /// Inserts or replaces a backend row.
    pub fn insert_row(&self, table: &TableName, pk: Vec<Value>, row: Row) {
        self.rows
            .entry(table.clone())
            .or_default()
            .insert(Self::pk_key(&pk), row);
    }

    /// Removes a backend row.
    pub fn remove_row(&self, table: &TableName, pk: &[Value]) {
        if let Some(mut rows) = self.rows.get_mut(table) {
            rows.remove(&Self::pk_key(pk));
        }
    }

    /// Makes every subsequent fetch fail with `backend unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    /// Number of fetch requests (a batched fetch counts once).
    pub fn fetch_calls(&self) -> u64 {
        self.fetch_calls.load(Ordering::Relaxed)
    }

    /// Total primary keys requested across all fetches.
    pub fn keys_fetched(&self) -> u64 {
        self.keys_fetched.load(Ordering::Relaxed)
    }

    fn check_available(&self) -> Result<(), BackendError> {
        if self.unavailable.load(Ordering::Relaxed) {
            Err(BackendError::unavailable("test backend marked down"))
        } else {
            Ok(())
        }
    }

    fn get(&self, table: &TableName, pk: &[Value]) -> Option<Row> {
        self.rows
            .get(table)
            .and_then(|rows| rows.get(&Self::pk_key(pk)).cloned())
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RowBackend for MemoryBackend {
    fn fetch_row(
        &self,
        table: &TableName,
        pk: &[Value],
    ) -> std::result::Result<Option<Row>, BackendError> {
        self.fetch_calls.fetch_add(1, Ordering::Relaxed);
        self.keys_fetched.fetch_add(1, Ordering::Relaxed);
        self.check_available()?;
        Ok(self.get(table, pk))
    }

    fn fetch_rows(
        &self,
        table: &TableName,
        pks: &[Vec<Value>],
    ) -> std::result::Result<Vec<(Vec<Value>, Row)>, BackendError> {
        self.fetch_calls.fetch_add(1, Ordering::Relaxed);
        self.keys_fetched.fetch_add(pks.len() as u64, Ordering::Relaxed);
        self.check_available()?;
        Ok(pks
            .iter()
            .filter_map(|pk| self.get(table, pk).map(|row| (pk.clone(), row)))
            .collect())
    }
}

/// Table with a two-column primary key `(eid int, bid text)` plus a data
/// column, mirroring the common shape of cached fixtures.
pub fn accounts_table(comment: Option<&str>) -> TableInfo {
    TableInfo::new(
        "accounts",
        vec![
            ColumnDefinition::new("eid", ColumnType::Int),
            ColumnDefinition::new("bid", ColumnType::Text),
            ColumnDefinition::new("name", ColumnType::Text),
        ],
        vec!["eid", "bid"],
        comment,
    )
}

/// Table with a single integer primary key, for IN-list scenarios.
pub fn events_table() -> TableInfo {
    TableInfo::new(
        "events",
        vec![
            ColumnDefinition::new("eid", ColumnType::Int),
            ColumnDefinition::new("data", ColumnType::Text),
        ],
        vec!["eid"],
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_backend_fetch_counters() {
        let backend = MemoryBackend::new();
        let table = TableName::new("events");
        backend.insert_row(
            &table,
            vec![Value::Int(1)],
            Row::new(vec![Value::Int(1), Value::Text("a".into())]),
        );

        let fetched = backend
            .fetch_rows(&table, &[vec![Value::Int(1)], vec![Value::Int(2)]])
            .unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(backend.fetch_calls(), 1);
        assert_eq!(backend.keys_fetched(), 2);
    }

    #[test]
    fn test_memory_backend_unavailable() {
        let backend = MemoryBackend::new();
        backend.set_unavailable(true);
        let err = backend
            .fetch_row(&TableName::new("events"), &[Value::Int(1)])
            .unwrap_err();
        assert!(err.to_string().starts_with("backend unavailable"));
    }
}
