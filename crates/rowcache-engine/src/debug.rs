//! Observability snapshot exposed to debug tooling.

use std::collections::BTreeMap;

use serde::Serialize;

/// Counters for one table.
#[derive(Debug, Clone, Serialize)]
pub struct TableVars {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Point-in-time snapshot of every cache counter, addressable by table
/// name. Serializable for debug endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct DebugVars {
    pub spot_check_ratio: f64,
    pub spot_check_attempts: u64,
    pub spot_check_mismatches: u64,
    pub spot_check_fetch_failures: u64,
    pub tables: BTreeMap<String, TableVars>,
}
