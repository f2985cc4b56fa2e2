//! Per-table cache mode.

use serde::{Deserialize, Serialize};

/// Per-table policy governing how the row cache participates in queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CacheMode {
    /// The cache is bypassed entirely for this table.
    Disabled,
    /// Reads bypass the cache; only invalidation bookkeeping happens. Used
    /// for tables physically realized behind a view/partition pair, where
    /// reads go through the view but writes land on the members.
    WriteOnly,
    /// Reads are served from cache; misses populate it.
    ReadWrite,
}

impl CacheMode {
    /// Returns true for any mode that keeps per-table cache state around.
    pub fn is_cacheable(&self) -> bool {
        !matches!(self, CacheMode::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_cacheable() {
        assert!(!CacheMode::Disabled.is_cacheable());
        assert!(CacheMode::WriteOnly.is_cacheable());
        assert!(CacheMode::ReadWrite.is_cacheable());
    }
}
