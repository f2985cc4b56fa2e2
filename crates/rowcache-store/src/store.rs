//! Row store implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use parking_lot::RwLock;

use rowcache_commons::{RowKey, TableName};

/// One resident cache entry.
///
/// `last_access` is updated on every hit and drives LRU eviction; it is an
/// atomic so hits never take a write lock on the entry.
struct CacheEntry {
    payload: Arc<[u8]>,
    generation: u64,
    last_access: AtomicU64,
}

impl CacheEntry {
    fn new(payload: Arc<[u8]>, generation: u64) -> Self {
        Self {
            payload,
            generation,
            last_access: AtomicU64::new(now_millis()),
        }
    }

    fn view(&self) -> EntryView {
        EntryView {
            payload: Arc::clone(&self.payload),
            generation: self.generation,
        }
    }
}

/// Read snapshot of an entry: zero-copy payload plus the generation marker
/// used for optimistic replacement during spot checks.
#[derive(Debug, Clone)]
pub struct EntryView {
    pub payload: Arc<[u8]>,
    pub generation: u64,
}

/// Monotonically increasing per-table counters. Lifecycle is tied to the
/// shard: dropped or renamed away with it, never implicitly reset.
#[derive(Default)]
struct TableStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Point-in-time copy of one table's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// All cache state for one table: its entries and its counters.
struct TableShard {
    entries: DashMap<RowKey, CacheEntry>,
    stats: TableStats,
}

impl TableShard {
    fn new() -> Self {
        Self {
            entries: DashMap::new(),
            stats: TableStats::default(),
        }
    }
}

/// The in-memory row cache proper.
///
/// Holds no references into the schema registry: association with table
/// metadata is by name only, re-resolved by the caller per operation.
pub struct RowStore {
    shards: RwLock<HashMap<TableName, Arc<TableShard>>>,
    max_entries_per_table: usize,
    generation: AtomicU64,
}

impl RowStore {
    pub fn new(max_entries_per_table: usize) -> Self {
        Self {
            shards: RwLock::new(HashMap::new()),
            max_entries_per_table,
            generation: AtomicU64::new(0),
        }
    }

    fn shard(&self, table: &TableName) -> Option<Arc<TableShard>> {
        self.shards.read().get(table).map(Arc::clone)
    }

    /// Establishes a fresh, empty shard with zeroed stats for a table that
    /// just became cacheable. Replaces any existing shard: a disable/enable
    /// cycle starts from nothing.
    pub fn create_table(&self, table: &TableName) {
        self.shards
            .write()
            .insert(table.clone(), Arc::new(TableShard::new()));
    }

    /// Looks up a row by canonical key, recording the hit or miss atomically
    /// with the access.
    ///
    /// Returns `None` without touching any counter when the table has no
    /// shard (not cacheable, or racing a structural transition).
    pub fn get(&self, table: &TableName, key: &RowKey) -> Option<EntryView> {
        let shard = self.shard(table)?;
        // Bound to a local so the map guard drops before the shard Arc.
        let view = match shard.entries.get(key) {
            Some(entry) => {
                shard.stats.hits.fetch_add(1, Ordering::Relaxed);
                entry.last_access.store(now_millis(), Ordering::Relaxed);
                Some(entry.view())
            }
            None => {
                shard.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        };
        view
    }

    /// Inserts or overwrites a row, returning the generation assigned to the
    /// new entry.
    ///
    /// Returns `None` when the table has no shard, which rejects stale puts
    /// still in flight for a table that was disabled or renamed away since
    /// the caller resolved policy.
    pub fn put(&self, table: &TableName, key: RowKey, payload: Arc<[u8]>) -> Option<u64> {
        let shard = match self.shard(table) {
            Some(s) => s,
            None => {
                log::debug!("rejecting put for unresident table '{}'", table);
                return None;
            }
        };
        if shard.entries.len() >= self.max_entries_per_table && !shard.entries.contains_key(&key) {
            Self::evict_lru(&shard);
        }
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        shard
            .entries
            .insert(key, CacheEntry::new(payload, generation));
        Some(generation)
    }

    /// Replaces an entry's payload only if its generation still matches the
    /// one observed at read time. Used by spot-check self-heal so an audit
    /// never clobbers a concurrent write-path update.
    pub fn replace_if_generation(
        &self,
        table: &TableName,
        key: &RowKey,
        payload: Arc<[u8]>,
        expected_generation: u64,
    ) -> bool {
        let shard = match self.shard(table) {
            Some(s) => s,
            None => return false,
        };
        let replaced = match shard.entries.get_mut(key) {
            Some(mut entry) if entry.generation == expected_generation => {
                let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
                entry.payload = payload;
                entry.generation = generation;
                entry.last_access.store(now_millis(), Ordering::Relaxed);
                true
            }
            _ => false,
        };
        replaced
    }

    /// Removes one row. Returns true if an entry was resident.
    pub fn delete(&self, table: &TableName, key: &RowKey) -> bool {
        match self.shard(table) {
            Some(shard) => shard.entries.remove(key).is_some(),
            None => false,
        }
    }

    /// Evicts all of a table's entries but keeps its shard and counters.
    /// Used on generic alters, where the payload shape may have changed but
    /// the table remains cacheable.
    pub fn clear_table(&self, table: &TableName) {
        if let Some(shard) = self.shard(table) {
            shard.entries.clear();
        }
    }

    /// Drops a table's shard entirely: entries and stats. Used on table
    /// drop and on cache-mode transitions to `Disabled`.
    pub fn delete_table(&self, table: &TableName) {
        self.shards.write().remove(table);
    }

    /// Atomically re-keys a table's shard (entries and stats together) from
    /// the old name to the new one. After this returns, the old name reports
    /// nothing and the new name serves the pre-rename state intact.
    pub fn rename_table(&self, from: &TableName, to: &TableName) -> bool {
        let mut shards = self.shards.write();
        match shards.remove(from) {
            Some(shard) => {
                shards.insert(to.clone(), shard);
                true
            }
            None => false,
        }
    }

    /// Counters for one table, or `None` when the table has no shard.
    pub fn stats(&self, table: &TableName) -> Option<StatsSnapshot> {
        let shard = self.shard(table)?;
        Some(StatsSnapshot {
            hits: shard.stats.hits.load(Ordering::Relaxed),
            misses: shard.stats.misses.load(Ordering::Relaxed),
            entries: shard.entries.len(),
        })
    }

    /// Number of resident entries for a table (0 when no shard).
    pub fn entry_count(&self, table: &TableName) -> usize {
        self.shard(table).map(|s| s.entries.len()).unwrap_or(0)
    }

    /// Names of all tables with resident shards.
    pub fn table_names(&self) -> Vec<TableName> {
        self.shards.read().keys().cloned().collect()
    }

    /// Scans the shard for the least recently used entry and removes it.
    /// O(n), but only runs when the shard is at capacity.
    fn evict_lru(shard: &TableShard) {
        let mut oldest_key: Option<RowKey> = None;
        let mut oldest_access = u64::MAX;
        for entry in shard.entries.iter() {
            let accessed = entry.value().last_access.load(Ordering::Relaxed);
            if accessed < oldest_access {
                oldest_access = accessed;
                oldest_key = Some(entry.key().clone());
            }
        }
        if let Some(key) = oldest_key {
            shard.entries.remove(&key);
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    fn key(bytes: &[u8]) -> RowKey {
        RowKey::from_bytes(bytes.to_vec())
    }

    fn payload(text: &str) -> Arc<[u8]> {
        text.as_bytes().to_vec().into()
    }

    #[test]
    fn test_get_put_delete() {
        let store = RowStore::new(100);
        let table = TableName::new("accounts");
        store.create_table(&table);

        assert!(store.get(&table, &key(b"k1")).is_none());
        store.put(&table, key(b"k1"), payload("row1")).unwrap();

        let entry = store.get(&table, &key(b"k1")).expect("entry resident");
        assert_eq!(&*entry.payload, b"row1");

        assert!(store.delete(&table, &key(b"k1")));
        assert!(store.get(&table, &key(b"k1")).is_none());
    }

    #[test]
    fn test_hit_miss_counters() {
        let store = RowStore::new(100);
        let table = TableName::new("accounts");
        store.create_table(&table);

        store.get(&table, &key(b"k1")); // miss
        store.put(&table, key(b"k1"), payload("row1"));
        store.get(&table, &key(b"k1")); // hit
        store.get(&table, &key(b"k1")); // hit

        let stats = store.stats(&table).unwrap();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_put_without_shard_is_rejected() {
        let store = RowStore::new(100);
        let table = TableName::new("ghost");
        assert_eq!(store.put(&table, key(b"k1"), payload("row1")), None);
        assert_eq!(store.entry_count(&table), 0);
        assert!(store.stats(&table).is_none());
    }

    #[test]
    fn test_lru_eviction_at_capacity() {
        let store = RowStore::new(3);
        let table = TableName::new("accounts");
        store.create_table(&table);

        store.put(&table, key(b"k1"), payload("r1"));
        thread::sleep(Duration::from_millis(5));
        store.put(&table, key(b"k2"), payload("r2"));
        thread::sleep(Duration::from_millis(5));
        store.put(&table, key(b"k3"), payload("r3"));
        thread::sleep(Duration::from_millis(5));

        // Touch k1 so k2 becomes the oldest.
        store.get(&table, &key(b"k1"));
        thread::sleep(Duration::from_millis(5));

        store.put(&table, key(b"k4"), payload("r4"));
        assert_eq!(store.entry_count(&table), 3);
        assert!(store.get(&table, &key(b"k2")).is_none());
        assert!(store.get(&table, &key(b"k1")).is_some());
        assert!(store.get(&table, &key(b"k4")).is_some());
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let store = RowStore::new(2);
        let table = TableName::new("accounts");
        store.create_table(&table);

        store.put(&table, key(b"k1"), payload("r1"));
        store.put(&table, key(b"k2"), payload("r2"));
        // Overwriting a resident key at capacity must not evict anything.
        store.put(&table, key(b"k2"), payload("r2b"));
        assert_eq!(store.entry_count(&table), 2);
        assert!(store.get(&table, &key(b"k1")).is_some());
        assert_eq!(&*store.get(&table, &key(b"k2")).unwrap().payload, b"r2b");
    }

    #[test]
    fn test_rename_moves_entries_and_stats() {
        let store = RowStore::new(100);
        let from = TableName::new("accounts");
        let to = TableName::new("accounts_renamed");
        store.create_table(&from);
        store.put(&from, key(b"k1"), payload("row1"));
        store.get(&from, &key(b"k1")); // hit = 1

        assert!(store.rename_table(&from, &to));

        assert!(store.stats(&from).is_none());
        assert_eq!(store.entry_count(&from), 0);

        let stats = store.stats(&to).unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.entries, 1);
        assert!(store.get(&to, &key(b"k1")).is_some());
    }

    #[test]
    fn test_delete_table_drops_stats() {
        let store = RowStore::new(100);
        let table = TableName::new("accounts");
        store.create_table(&table);
        store.put(&table, key(b"k1"), payload("row1"));

        store.delete_table(&table);
        assert!(store.stats(&table).is_none());
        assert_eq!(store.entry_count(&table), 0);

        // Re-creating starts from zeroed stats and no entries.
        store.create_table(&table);
        let stats = store.stats(&table).unwrap();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.entries, 0);
    }

    #[test]
    fn test_clear_table_keeps_stats() {
        let store = RowStore::new(100);
        let table = TableName::new("accounts");
        store.create_table(&table);
        store.put(&table, key(b"k1"), payload("row1"));
        store.get(&table, &key(b"k1"));

        store.clear_table(&table);
        let stats = store.stats(&table).unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.entries, 0);
    }

    #[test]
    fn test_replace_if_generation() {
        let store = RowStore::new(100);
        let table = TableName::new("accounts");
        store.create_table(&table);

        let gen1 = store.put(&table, key(b"k1"), payload("old")).unwrap();
        assert!(store.replace_if_generation(&table, &key(b"k1"), payload("new"), gen1));
        assert_eq!(&*store.get(&table, &key(b"k1")).unwrap().payload, b"new");

        // Stale generation loses.
        assert!(!store.replace_if_generation(&table, &key(b"k1"), payload("older"), gen1));
        assert_eq!(&*store.get(&table, &key(b"k1")).unwrap().payload, b"new");
    }

    #[test]
    fn test_concurrent_readers_and_writers() {
        let store = Arc::new(RowStore::new(1000));
        let table = TableName::new("accounts");
        store.create_table(&table);

        let mut handles = vec![];
        for t in 0..8 {
            let store = Arc::clone(&store);
            let table = table.clone();
            handles.push(thread::spawn(move || {
                for i in 0..200 {
                    let k = key(format!("{}:{}", t, i).as_bytes());
                    store.put(&table, k.clone(), payload("row"));
                    assert!(store.get(&table, &k).is_some());
                }
            }));
        }
        for handle in handles {
            handle.join().expect("thread panicked");
        }
        assert_eq!(store.entry_count(&table), 8 * 200);
    }
}
