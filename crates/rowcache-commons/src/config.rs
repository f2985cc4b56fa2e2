//! Runtime configuration for the rowcache subsystem.
//!
//! The embedding server owns config-file parsing; this module only defines
//! the validated structs handed to the cache at initialization.

use crate::errors::{CacheError, Result};
use crate::mode::CacheMode;
use crate::table_name::TableName;

/// Explicit cache-mode assignment for one table.
///
/// Overrides take precedence over auto-inferred eligibility. They exist for
/// tables and views whose shape the inference heuristic cannot classify,
/// e.g. forcing `ReadWrite` on a view and `WriteOnly` on the partition
/// tables backing it. Inference-derived ineligibility (no usable primary
/// key, disabling annotation) can never be overridden into eligibility.
#[derive(Debug, Clone)]
pub struct CacheOverride {
    pub table: TableName,
    pub mode: CacheMode,
}

impl CacheOverride {
    pub fn new(table: impl Into<TableName>, mode: CacheMode) -> Self {
        Self {
            table: table.into(),
            mode,
        }
    }
}

/// Cache-wide configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum resident entries per table before LRU eviction.
    pub max_entries_per_table: usize,

    /// Initial spot-check sampling ratio in `[0, 1]`. 0 = never audit a
    /// cache hit, 1 = audit every hit. Adjustable at runtime.
    pub spot_check_ratio: f64,

    /// Explicit cache-mode assignments applied at schema load.
    pub overrides: Vec<CacheOverride>,
}

impl CacheConfig {
    pub const DEFAULT_MAX_ENTRIES_PER_TABLE: usize = 10_000;

    /// Validates field ranges.
    pub fn validate(&self) -> Result<()> {
        if self.max_entries_per_table == 0 {
            return Err(CacheError::invalid_argument(
                "max_entries_per_table must be greater than zero",
            ));
        }
        if !(0.0..=1.0).contains(&self.spot_check_ratio) {
            return Err(CacheError::invalid_argument(format!(
                "spot_check_ratio must be within [0, 1], got {}",
                self.spot_check_ratio
            )));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries_per_table: Self::DEFAULT_MAX_ENTRIES_PER_TABLE,
            spot_check_ratio: 0.0,
            overrides: Vec::new(),
        }
    }
}
