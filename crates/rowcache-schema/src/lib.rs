//! # rowcache-schema
//!
//! Schema registry and cache policy resolution.
//!
//! The registry owns table descriptors exclusively: per-table column
//! metadata, primary-key shape, and the resolved `CacheMode`. Everything
//! downstream (key codec, row store, invalidation) re-resolves table
//! identity through the registry per operation rather than holding
//! references into it, so a rename can never leave stale pointers behind.

pub mod descriptor;
pub mod registry;

pub use descriptor::{ColumnDefinition, TableDescriptor, TableInfo};
pub use registry::SchemaRegistry;
