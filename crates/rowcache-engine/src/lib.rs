//! # rowcache-engine
//!
//! The engine ties the rowcache subsystem together: key derivation, the
//! cache-aware lookup path, probabilistic spot-check verification, and
//! DDL-driven invalidation.
//!
//! ## Data flow
//!
//! ```text
//! incoming point lookup
//!   → SchemaRegistry::resolve (is this table cacheable, and how)
//!   → codec::encode_key (derive + type-check the cache key)
//!   → RowStore (serve hits, batch-fetch misses via RowBackend)
//!   → SpotChecker (probabilistically audit each hit)
//!   → LookupResult
//! ```
//!
//! DDL notifications flow out-of-band into `CacheEngine::apply_ddl`, which
//! mutates registry and store state for the one affected table.

pub mod backend;
pub mod codec;
pub mod ddl;
pub mod debug;
pub mod engine;
pub mod spotcheck;
pub mod testing;

pub use backend::RowBackend;
pub use ddl::DdlEvent;
pub use debug::{DebugVars, TableVars};
pub use engine::{CacheEngine, LookupRequest, LookupResult, Predicate};
pub use spotcheck::{RandomSampler, Sampler, SpotChecker};
