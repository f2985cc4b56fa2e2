//! Backend abstraction for primary-key row fetches.
//!
//! The cache sits in front of a relational backend it does not own. This
//! trait is the seam: fetch-on-miss, write-path refresh, and spot-check
//! re-fetches all go through it. Implementations wrap the real connection
//! pool; tests use the in-memory backend from [`crate::testing`].

use rowcache_commons::{BackendError, Row, TableName, Value};

/// A source of truth for rows, addressed by primary key.
///
/// Calls may block (network round-trip). The engine invokes them only on
/// cache misses and sampled spot checks, never on a plain hit.
pub trait RowBackend: Send + Sync {
    /// Fetches a single row by primary key. `Ok(None)` means the row does
    /// not exist, which is a normal outcome and is never cached negatively.
    fn fetch_row(
        &self,
        table: &TableName,
        pk: &[Value],
    ) -> std::result::Result<Option<Row>, BackendError>;

    /// Fetches several rows in one batched request, returning each found
    /// row paired with the primary-key tuple that addressed it. Absent rows
    /// are simply missing from the result.
    ///
    /// The default implementation degrades to per-row fetches; real
    /// backends should override it with a single batched statement.
    fn fetch_rows(
        &self,
        table: &TableName,
        pks: &[Vec<Value>],
    ) -> std::result::Result<Vec<(Vec<Value>, Row)>, BackendError> {
        let mut out = Vec::with_capacity(pks.len());
        for pk in pks {
            if let Some(row) = self.fetch_row(table, pk)? {
                out.push((pk.clone(), row));
            }
        }
        Ok(out)
    }
}
