//! The cache engine: policy-aware lookup, write invalidation, and DDL
//! application.

use std::sync::Arc;

use rowcache_commons::{CacheConfig, CacheError, CacheMode, Result, Row, TableName, Value};
use rowcache_schema::{SchemaRegistry, TableInfo};
use rowcache_store::RowStore;

use crate::backend::RowBackend;
use crate::codec;
use crate::ddl::DdlEvent;
use crate::debug::{DebugVars, TableVars};
use crate::spotcheck::{Sampler, SpotChecker};

/// Primary-key predicate of a cache-eligible point lookup, as decided by
/// the query planner.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// `pk = (...)`: one value per primary-key column, in key order.
    Point(Vec<Value>),
    /// `pk IN (...)`: one tuple per requested row.
    InList(Vec<Vec<Value>>),
}

/// One cache-eligible statement handed over by the planner.
#[derive(Debug, Clone)]
pub struct LookupRequest {
    pub table: TableName,
    pub predicate: Predicate,
    /// Row-limiting clause, if the statement carried one.
    pub limit: Option<i64>,
}

impl LookupRequest {
    pub fn point(table: impl Into<TableName>, values: Vec<Value>) -> Self {
        Self {
            table: table.into(),
            predicate: Predicate::Point(values),
            limit: None,
        }
    }

    pub fn in_list(table: impl Into<TableName>, tuples: Vec<Vec<Value>>) -> Self {
        Self {
            table: table.into(),
            predicate: Predicate::InList(tuples),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Result of a lookup: the rows (no guaranteed order for IN-lists) and
/// whether every requested key was served from cache.
#[derive(Debug, Clone)]
pub struct LookupResult {
    pub rows: Vec<Row>,
    pub from_cache: bool,
}

/// The row cache engine.
///
/// Process-scoped, explicitly constructed and injected; holds the schema
/// registry, the row store, the backend handle, and the spot-check
/// verifier. All methods are safe to call from many request threads at
/// once.
pub struct CacheEngine {
    registry: Arc<SchemaRegistry>,
    store: Arc<RowStore>,
    backend: Arc<dyn RowBackend>,
    spot_checker: SpotChecker,
    overrides: Vec<rowcache_commons::CacheOverride>,
}

impl CacheEngine {
    pub fn new(
        registry: Arc<SchemaRegistry>,
        backend: Arc<dyn RowBackend>,
        config: CacheConfig,
    ) -> Result<Self> {
        Self::with_sampler(
            registry,
            backend,
            config,
            Box::new(crate::spotcheck::RandomSampler),
        )
    }

    /// Like [`CacheEngine::new`] but with an injected randomness source for
    /// the spot-check draw.
    pub fn with_sampler(
        registry: Arc<SchemaRegistry>,
        backend: Arc<dyn RowBackend>,
        config: CacheConfig,
        sampler: Box<dyn Sampler>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            registry,
            store: Arc::new(RowStore::new(config.max_entries_per_table)),
            backend,
            spot_checker: SpotChecker::with_sampler(config.spot_check_ratio, sampler),
            overrides: config.overrides,
        })
    }

    /// Loads the schema registry from backend catalog metadata, applying
    /// the configured overrides, and establishes store shards for every
    /// cacheable table. Called once at startup.
    pub fn load_schema(&self, tables: Vec<TableInfo>) {
        self.registry.load(tables, self.overrides.clone());
        for table in self.registry.table_names() {
            if self.registry.resolve(&table).is_cacheable() {
                self.store.create_table(&table);
            }
        }
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<RowStore> {
        &self.store
    }

    /// Serves a point or IN-list lookup, consulting the cache when the
    /// table's mode allows it.
    ///
    /// Argument validation (limit, list emptiness, key types) happens
    /// before any backend access. For `ReadWrite` tables, hits are served
    /// from the store, misses are fetched from the backend in one batched
    /// request and then populate the cache; for every other mode the
    /// request passes straight through to the backend.
    pub fn lookup(&self, request: &LookupRequest) -> Result<LookupResult> {
        codec::check_limit(request.limit)?;
        if let Predicate::InList(tuples) = &request.predicate {
            if tuples.is_empty() {
                return Err(CacheError::EmptyList(request.table.clone()));
            }
        }

        let mode = self.registry.resolve(&request.table);
        if mode != CacheMode::ReadWrite {
            return self.lookup_bypass(request);
        }

        let descriptor = self
            .registry
            .describe(&request.table)
            .ok_or_else(|| CacheError::TableNotFound(request.table.clone()))?;

        let tuples: &[Vec<Value>] = match &request.predicate {
            Predicate::Point(values) => std::slice::from_ref(values),
            Predicate::InList(tuples) => tuples,
        };
        let keys = codec::encode_key_list(&descriptor, tuples)?;

        let mut rows = Vec::with_capacity(tuples.len());
        let mut missing: Vec<Vec<Value>> = Vec::new();
        for (tuple, key) in tuples.iter().zip(&keys) {
            match self.store.get(&request.table, key) {
                Some(entry) => match Row::from_payload(&entry.payload) {
                    Ok(row) => {
                        self.spot_checker.maybe_verify(
                            self.backend.as_ref(),
                            &self.store,
                            &request.table,
                            tuple,
                            key,
                            &entry,
                        );
                        rows.push(row);
                    }
                    Err(err) => {
                        // Undecodable payloads are evicted and re-fetched.
                        log::warn!(
                            "evicting undecodable cache entry for table '{}': {}",
                            request.table,
                            err
                        );
                        self.store.delete(&request.table, key);
                        missing.push(tuple.clone());
                    }
                },
                None => missing.push(tuple.clone()),
            }
        }

        let from_cache = missing.is_empty();
        if !missing.is_empty() {
            let fetched = self.backend.fetch_rows(&request.table, &missing)?;
            for (pk, row) in fetched {
                self.populate(&request.table, &descriptor, &pk, &row);
                rows.push(row);
            }
        }

        if let Some(limit) = request.limit {
            rows.truncate(limit as usize);
        }
        Ok(LookupResult { rows, from_cache })
    }

    /// Direct-to-backend path for `Disabled` and `WriteOnly` tables. No
    /// stats are recorded and nothing is populated.
    fn lookup_bypass(&self, request: &LookupRequest) -> Result<LookupResult> {
        let tuples: &[Vec<Value>] = match &request.predicate {
            Predicate::Point(values) => std::slice::from_ref(values),
            Predicate::InList(tuples) => tuples,
        };
        let fetched = self.backend.fetch_rows(&request.table, tuples)?;
        let mut rows: Vec<Row> = fetched.into_iter().map(|(_, row)| row).collect();
        if let Some(limit) = request.limit {
            rows.truncate(limit as usize);
        }
        Ok(LookupResult {
            rows,
            from_cache: false,
        })
    }

    /// Populates one freshly fetched row, re-checking current policy
    /// immediately before the put so an in-flight fetch can never resurrect
    /// an entry for a table that was disabled or renamed away meanwhile.
    fn populate(
        &self,
        table: &TableName,
        descriptor: &rowcache_schema::TableDescriptor,
        pk: &[Value],
        row: &Row,
    ) {
        if self.registry.resolve(table) != CacheMode::ReadWrite {
            log::debug!("skipping stale populate for table '{}'", table);
            return;
        }
        // Key re-derivation cannot fail here: the tuple already passed
        // encode_key_list above. Payload failures just skip population.
        let key = match codec::encode_key(descriptor, pk) {
            Ok(key) => key,
            Err(_) => return,
        };
        if let Ok(payload) = row.to_payload() {
            self.store.put(table, key, payload.into());
        }
    }

    /// Write-path invalidation: removes the cached entry for a row that an
    /// update or delete statement touched. Must complete before the write
    /// is acknowledged, so a subsequent read never observes the stale row.
    ///
    /// Applies to `ReadWrite` and `WriteOnly` tables; a no-op for
    /// `Disabled` ones.
    pub fn invalidate_row(&self, table: &TableName, pk: &[Value]) -> Result<()> {
        if !self.registry.resolve(table).is_cacheable() {
            return Ok(());
        }
        let descriptor = self
            .registry
            .describe(table)
            .ok_or_else(|| CacheError::TableNotFound(table.clone()))?;
        let key = codec::encode_key(&descriptor, pk)?;
        self.store.delete(table, &key);
        Ok(())
    }

    /// Applies one DDL notification. Failures are scoped to the affected
    /// table; state for other tables is never touched.
    pub fn apply_ddl(&self, event: DdlEvent) -> Result<()> {
        match event {
            DdlEvent::Created { info } => {
                let descriptor = self.registry.register_or_update(info);
                if descriptor.cache_mode.is_cacheable() {
                    self.store.create_table(&descriptor.name);
                }
                Ok(())
            }
            DdlEvent::CommentChanged { table, comment } => {
                let descriptor = self
                    .registry
                    .describe(&table)
                    .ok_or_else(|| CacheError::TableNotFound(table.clone()))?;
                let old_mode = descriptor.cache_mode;
                // Rebuild from the declared key columns, not the resolved
                // ordinals, so an unusable key stays unusable.
                let info = TableInfo {
                    name: table.clone(),
                    columns: descriptor.columns.clone(),
                    pk_columns: descriptor.pk_columns.clone(),
                    comment,
                };
                let new_mode = self.registry.register_or_update(info).cache_mode;
                self.transition(&table, old_mode, new_mode);
                Ok(())
            }
            DdlEvent::Renamed { from, to } => {
                self.registry
                    .rename(&from, &to)
                    .ok_or(CacheError::TableNotFound(from.clone()))?;
                self.store.rename_table(&from, &to);
                log::debug!("renamed cache state '{}' -> '{}'", from, to);
                Ok(())
            }
            DdlEvent::Altered { info } => {
                let table = info.name.clone();
                let old_mode = self.registry.resolve(&table);
                let new_mode = self.registry.register_or_update(info).cache_mode;
                match (old_mode.is_cacheable(), new_mode.is_cacheable()) {
                    // Payload shape may have changed: evict everything,
                    // keep the counters.
                    (true, true) => self.store.clear_table(&table),
                    (true, false) => self.store.delete_table(&table),
                    (false, true) => self.store.create_table(&table),
                    (false, false) => {}
                }
                Ok(())
            }
            DdlEvent::Dropped { table } => {
                self.registry.remove(&table);
                self.store.delete_table(&table);
                Ok(())
            }
        }
    }

    /// Mode transition bookkeeping shared by comment-driven changes.
    fn transition(&self, table: &TableName, old_mode: CacheMode, new_mode: CacheMode) {
        match (old_mode.is_cacheable(), new_mode.is_cacheable()) {
            (true, false) => {
                log::debug!("cache disabled for table '{}'", table);
                self.store.delete_table(table);
            }
            (false, true) => {
                log::debug!("cache enabled for table '{}'", table);
                self.store.create_table(table);
            }
            _ => {}
        }
    }

    /// Current spot-check sampling ratio.
    pub fn spot_check_ratio(&self) -> f64 {
        self.spot_checker.ratio()
    }

    /// Updates the spot-check sampling ratio; effective on the next hit.
    pub fn set_spot_check_ratio(&self, ratio: f64) {
        self.spot_checker.set_ratio(ratio);
    }

    /// Snapshot of all observability counters.
    pub fn debug_vars(&self) -> DebugVars {
        let mut tables = std::collections::BTreeMap::new();
        for table in self.store.table_names() {
            if let Some(stats) = self.store.stats(&table) {
                tables.insert(
                    table.into_string(),
                    TableVars {
                        hits: stats.hits,
                        misses: stats.misses,
                        entries: stats.entries,
                    },
                );
            }
        }
        DebugVars {
            spot_check_ratio: self.spot_checker.ratio(),
            spot_check_attempts: self.spot_checker.attempts(),
            spot_check_mismatches: self.spot_checker.mismatches(),
            spot_check_fetch_failures: self.spot_checker.fetch_failures(),
            tables,
        }
    }

    /// Per-table counters, or `None` after drop/rename/disable.
    pub fn table_stats(&self, table: &TableName) -> Option<rowcache_store::StatsSnapshot> {
        self.store.stats(table)
    }
}
