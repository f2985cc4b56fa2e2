//! # rowcache-commons
//!
//! Shared types, errors, and configuration for the rowcache subsystem.
//!
//! This crate provides the foundational vocabulary used across all rowcache
//! crates (rowcache-schema, rowcache-store, rowcache-engine). It carries no
//! concurrency primitives or business logic of its own, which keeps the
//! dependency graph acyclic.
//!
//! ## Type-Safe Wrappers
//!
//! - `TableName`: case-insensitive table identifier wrapper
//! - `RowKey`: canonical, hashable encoding of a primary-key value tuple
//!
//! ## Value Model
//!
//! Bind variables and literals arrive from the query planner as dynamically
//! typed values. `Value` models them as a tagged variant over
//! {null, integer, float, text, bytes} with a total, coercion-free
//! comparison against declared column types (`ColumnType`).
//!
//! ## Example Usage
//!
//! ```rust
//! use rowcache_commons::{ColumnType, TableName, Value};
//!
//! let table = TableName::new("Accounts");
//! assert_eq!(table.as_str(), "accounts");
//!
//! let v = Value::Int(42);
//! assert!(v.matches_type(ColumnType::Int));
//! assert!(!v.matches_type(ColumnType::Float));
//! ```

pub mod config;
pub mod errors;
pub mod key;
pub mod mode;
pub mod table_name;
pub mod value;

pub use config::{CacheConfig, CacheOverride};
pub use errors::{BackendError, CacheError, Result};
pub use key::RowKey;
pub use mode::CacheMode;
pub use table_name::TableName;
pub use value::{ColumnType, Row, Value};
