//! # rowcache-store
//!
//! The in-memory row store: get/put/delete by canonical key, per-table
//! hit/miss counters, capacity-bounded LRU eviction, and the structural
//! operations DDL invalidation needs (bulk eviction, atomic rename).
//!
//! ## Concurrency model
//!
//! Entries live in per-table shards. A shard is a lock-free `DashMap` keyed
//! by `RowKey`, so concurrent operations on unrelated keys never block each
//! other. The name-to-shard index is a `parking_lot::RwLock<HashMap>`:
//! entry operations take the read lock just long enough to clone the shard
//! `Arc`, while structural operations (create, drop, rename) take the write
//! lock for an O(1) re-key of the index. A rename therefore moves a table's
//! entries and stats wholesale, with no window in which both or neither
//! name is queryable, and without ever touching individual entries.

pub mod store;

pub use store::{EntryView, RowStore, StatsSnapshot};
