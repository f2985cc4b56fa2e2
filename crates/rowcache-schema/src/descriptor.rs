//! Table descriptors and cache-mode inference.

use serde::{Deserialize, Serialize};

use rowcache_commons::{CacheMode, ColumnType, TableName};

/// Token in a table comment that marks the table uncacheable.
///
/// Matching is case-insensitive and substring based, so operators can write
/// e.g. `'nocache: hot write path'` as the comment.
pub const NOCACHE_ANNOTATION: &str = "nocache";

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    pub column_type: ColumnType,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Raw table metadata as read from the backend catalog (or delivered by a
/// DDL notification). Input to descriptor construction; carries no resolved
/// cache mode yet.
#[derive(Debug, Clone)]
pub struct TableInfo {
    pub name: TableName,
    pub columns: Vec<ColumnDefinition>,
    /// Names of the primary-key columns, in key order. Empty when the table
    /// has no primary key.
    pub pk_columns: Vec<String>,
    pub comment: Option<String>,
}

impl TableInfo {
    pub fn new(
        name: impl Into<TableName>,
        columns: Vec<ColumnDefinition>,
        pk_columns: Vec<&str>,
        comment: Option<&str>,
    ) -> Self {
        Self {
            name: name.into(),
            columns,
            pk_columns: pk_columns.into_iter().map(String::from).collect(),
            comment: comment.map(String::from),
        }
    }

    /// Returns true when the comment carries the disabling annotation.
    pub fn has_nocache_annotation(&self) -> bool {
        self.comment
            .as_deref()
            .map(|c| c.to_lowercase().contains(NOCACHE_ANNOTATION))
            .unwrap_or(false)
    }
}

/// Immutable description of one table as the cache sees it.
///
/// Owned exclusively by the `SchemaRegistry`; consumers get `Arc` clones and
/// never mutate. Mutation happens only through DDL notifications, which
/// replace the descriptor wholesale.
#[derive(Debug, Clone)]
pub struct TableDescriptor {
    pub name: TableName,
    pub columns: Vec<ColumnDefinition>,
    /// Primary-key column names exactly as declared in the catalog,
    /// including any that did not resolve against the column list. Kept so
    /// descriptor updates rebuilt from this one (e.g. a comment change)
    /// re-run mode inference against the same declaration.
    pub pk_columns: Vec<String>,
    /// Ordinals into `columns` for the primary-key columns, in key order.
    pub pk_ordinals: Vec<usize>,
    pub cache_mode: CacheMode,
    pub comment: Option<String>,
}

impl TableDescriptor {
    /// Builds a descriptor from catalog metadata, resolving the cache mode.
    ///
    /// Mode resolution rules:
    /// - disabling annotation, missing primary key, a primary-key column not
    ///   present in the column list, or a float primary-key column always
    ///   yield `Disabled`, regardless of any override
    /// - otherwise an explicit override wins
    /// - otherwise the table defaults to `ReadWrite`
    pub fn from_info(info: TableInfo, override_mode: Option<CacheMode>) -> Self {
        let pk_ordinals = resolve_pk_ordinals(&info);
        let cache_mode = if info.has_nocache_annotation() || !usable_pk(&info, &pk_ordinals) {
            CacheMode::Disabled
        } else {
            override_mode.unwrap_or(CacheMode::ReadWrite)
        };
        Self {
            name: info.name,
            columns: info.columns,
            pk_columns: info.pk_columns,
            pk_ordinals,
            cache_mode,
            comment: info.comment,
        }
    }

    /// Primary-key column types, in key order.
    pub fn pk_types(&self) -> Vec<ColumnType> {
        self.pk_ordinals
            .iter()
            .map(|&i| self.columns[i].column_type)
            .collect()
    }

    /// Primary-key column names, in key order.
    pub fn pk_names(&self) -> Vec<&str> {
        self.pk_ordinals
            .iter()
            .map(|&i| self.columns[i].name.as_str())
            .collect()
    }

    /// Returns this descriptor re-keyed under a new name, preserving columns
    /// and mode. Used by rename handling.
    pub fn renamed(&self, new_name: TableName) -> Self {
        let mut desc = self.clone();
        desc.name = new_name;
        desc
    }
}

fn resolve_pk_ordinals(info: &TableInfo) -> Vec<usize> {
    info.pk_columns
        .iter()
        .filter_map(|pk| info.columns.iter().position(|c| &c.name == pk))
        .collect()
}

/// A primary key is usable when it exists, every declared key column was
/// found in the column list, and no key column is a float (float equality is
/// not a sound cache-key discriminator).
fn usable_pk(info: &TableInfo, ordinals: &[usize]) -> bool {
    !info.pk_columns.is_empty()
        && ordinals.len() == info.pk_columns.len()
        && ordinals
            .iter()
            .all(|&i| info.columns[i].column_type != ColumnType::Float)
}
