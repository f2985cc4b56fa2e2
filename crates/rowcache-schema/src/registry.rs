//! Schema registry: the single source of truth for table descriptors.
//!
//! Read-mostly. Lookups return an `Arc` snapshot of a descriptor, so a
//! reader can never observe a half-updated one; mutation replaces the map
//! entry wholesale under DashMap's per-entry lock. Policy resolution is a
//! plain lookup with no decision caching of its own, which makes it
//! immediately consistent after any DDL-driven update.

use std::sync::Arc;

use dashmap::DashMap;

use rowcache_commons::{CacheMode, CacheOverride, TableName};

use crate::descriptor::{TableDescriptor, TableInfo};

/// Process-scoped registry of table descriptors and cache-mode overrides.
///
/// Constructed explicitly at schema load time and injected into the engine,
/// never reached through static state, so tests build isolated instances.
pub struct SchemaRegistry {
    tables: DashMap<TableName, Arc<TableDescriptor>>,
    overrides: DashMap<TableName, CacheMode>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self {
            tables: DashMap::new(),
            overrides: DashMap::new(),
        }
    }

    /// Populates the registry from catalog metadata plus explicit overrides.
    pub fn load(&self, tables: Vec<TableInfo>, overrides: Vec<CacheOverride>) {
        for ov in overrides {
            self.overrides.insert(ov.table, ov.mode);
        }
        for info in tables {
            self.register_or_update(info);
        }
    }

    /// Registers a new table or replaces an existing descriptor, resolving
    /// the cache mode from annotations, primary-key shape, and overrides.
    ///
    /// Returns the freshly resolved descriptor.
    pub fn register_or_update(&self, info: TableInfo) -> Arc<TableDescriptor> {
        let override_mode = self.overrides.get(&info.name).map(|m| *m.value());
        let name = info.name.clone();
        let desc = Arc::new(TableDescriptor::from_info(info, override_mode));
        log::debug!(
            "registering table '{}' with cache mode {:?}",
            name,
            desc.cache_mode
        );
        self.tables.insert(name, Arc::clone(&desc));
        desc
    }

    /// Returns the descriptor for a table, if registered.
    pub fn describe(&self, table: &TableName) -> Option<Arc<TableDescriptor>> {
        self.tables.get(table).map(|e| Arc::clone(e.value()))
    }

    /// Removes a table's descriptor (table drop).
    pub fn remove(&self, table: &TableName) {
        self.tables.remove(table);
    }

    /// Re-keys a descriptor under a new name. The old name stops resolving
    /// before the new one starts; callers that race the rename re-resolve
    /// and observe one identity or the other, never a half-moved one.
    ///
    /// Overrides are keyed by name and do not follow the rename: the new
    /// name resolves against its own override entry, if any.
    pub fn rename(&self, from: &TableName, to: &TableName) -> Option<Arc<TableDescriptor>> {
        let (_, desc) = self.tables.remove(from)?;
        let renamed = Arc::new(desc.renamed(to.clone()));
        self.tables.insert(to.clone(), Arc::clone(&renamed));
        Some(renamed)
    }

    /// Cache Policy Resolver: the per-query mode decision.
    ///
    /// Pure function of current registry state; unknown tables are
    /// `Disabled`. Called on every query touching a table, and cheap enough
    /// that it is not itself cached.
    pub fn resolve(&self, table: &TableName) -> CacheMode {
        self.tables
            .get(table)
            .map(|e| e.value().cache_mode)
            .unwrap_or(CacheMode::Disabled)
    }

    /// Names of all registered tables.
    pub fn table_names(&self) -> Vec<TableName> {
        self.tables.iter().map(|e| e.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ColumnDefinition;
    use rowcache_commons::ColumnType;

    fn info(name: &str, comment: Option<&str>) -> TableInfo {
        TableInfo::new(
            name,
            vec![
                ColumnDefinition::new("eid", ColumnType::Int),
                ColumnDefinition::new("name", ColumnType::Text),
            ],
            vec!["eid"],
            comment,
        )
    }

    #[test]
    fn test_load_applies_overrides() {
        let registry = SchemaRegistry::new();
        registry.load(
            vec![info("part1", None), info("part2", None), info("plain", None)],
            vec![
                CacheOverride::new("part1", CacheMode::WriteOnly),
                CacheOverride::new("part2", CacheMode::WriteOnly),
            ],
        );

        assert_eq!(registry.resolve(&TableName::new("part1")), CacheMode::WriteOnly);
        assert_eq!(registry.resolve(&TableName::new("part2")), CacheMode::WriteOnly);
        assert_eq!(registry.resolve(&TableName::new("plain")), CacheMode::ReadWrite);
    }

    #[test]
    fn test_resolve_unknown_table_is_disabled() {
        let registry = SchemaRegistry::new();
        assert_eq!(
            registry.resolve(&TableName::new("missing")),
            CacheMode::Disabled
        );
    }

    #[test]
    fn test_annotation_cannot_be_overridden() {
        let registry = SchemaRegistry::new();
        registry.load(
            vec![info("hot", Some("nocache"))],
            vec![CacheOverride::new("hot", CacheMode::ReadWrite)],
        );
        assert_eq!(registry.resolve(&TableName::new("hot")), CacheMode::Disabled);
    }

    #[test]
    fn test_register_or_update_replaces_descriptor() {
        let registry = SchemaRegistry::new();
        registry.register_or_update(info("accounts", None));
        assert_eq!(
            registry.resolve(&TableName::new("accounts")),
            CacheMode::ReadWrite
        );

        // Comment change to the disabling annotation flips the mode.
        registry.register_or_update(info("accounts", Some("nocache")));
        assert_eq!(
            registry.resolve(&TableName::new("accounts")),
            CacheMode::Disabled
        );
    }

    #[test]
    fn test_rename_moves_descriptor() {
        let registry = SchemaRegistry::new();
        registry.register_or_update(info("accounts", None));

        let from = TableName::new("accounts");
        let to = TableName::new("accounts_renamed");
        let renamed = registry.rename(&from, &to).expect("descriptor present");

        assert_eq!(renamed.name, to);
        assert!(registry.describe(&from).is_none());
        assert_eq!(registry.resolve(&from), CacheMode::Disabled);
        assert_eq!(registry.resolve(&to), CacheMode::ReadWrite);
    }

    #[test]
    fn test_remove() {
        let registry = SchemaRegistry::new();
        registry.register_or_update(info("accounts", None));
        registry.remove(&TableName::new("accounts"));
        assert!(registry.describe(&TableName::new("accounts")).is_none());
    }
}
