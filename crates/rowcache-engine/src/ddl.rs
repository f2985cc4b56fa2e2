//! DDL notification model.
//!
//! The DDL executor delivers one event per completed schema change,
//! synchronously relative to the statement's own completion, so cache-side
//! effects are applied before the statement is acknowledged and the cache
//! never lags behind a finished schema change.

use rowcache_commons::TableName;
use rowcache_schema::TableInfo;

/// A table-change notification from the DDL execution layer.
#[derive(Debug, Clone)]
pub enum DdlEvent {
    /// A table was created.
    Created { info: TableInfo },

    /// Only the table comment changed (cache-policy annotation add/remove).
    CommentChanged {
        table: TableName,
        comment: Option<String>,
    },

    /// The table was renamed. Entries and stats move wholesale to the new
    /// identity; the old name immediately reports nothing.
    Renamed { from: TableName, to: TableName },

    /// Generic alter (column add/drop, type change). Carries the refreshed
    /// schema metadata; resident payloads may no longer match the new shape.
    Altered { info: TableInfo },

    /// The table was dropped.
    Dropped { table: TableName },
}
