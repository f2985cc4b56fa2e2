//! Spot-check verification of cache hits.
//!
//! On a configurable sampling ratio, a cache hit is re-fetched from the
//! backend and compared against the cached payload. A mismatch increments
//! the anomaly counter and self-heals the entry with the fresh value. The
//! audit never errors the original request: backend failures here are
//! logged, counted, and swallowed.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;

use rowcache_commons::{RowKey, TableName, Value};
use rowcache_store::{EntryView, RowStore};

use crate::backend::RowBackend;

/// Source of the uniform draw deciding whether a given hit is audited.
///
/// Injectable so tests can drive sampling deterministically; the draw must
/// be independent per event.
pub trait Sampler: Send + Sync {
    /// Returns a uniform value in `[0, 1)`.
    fn draw(&self) -> f64;
}

/// Default sampler backed by the thread-local RNG.
pub struct RandomSampler;

impl Sampler for RandomSampler {
    fn draw(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// The spot-check verifier: sampling ratio, anomaly counters, self-heal.
///
/// The ratio is shared, atomically-read configuration: `set_ratio` takes
/// effect on the very next hit, with no batching or delay.
pub struct SpotChecker {
    ratio_bits: AtomicU64,
    attempts: AtomicU64,
    mismatches: AtomicU64,
    fetch_failures: AtomicU64,
    sampler: Box<dyn Sampler>,
}

impl SpotChecker {
    pub fn new(ratio: f64) -> Self {
        Self::with_sampler(ratio, Box::new(RandomSampler))
    }

    pub fn with_sampler(ratio: f64, sampler: Box<dyn Sampler>) -> Self {
        Self {
            ratio_bits: AtomicU64::new(clamp_ratio(ratio).to_bits()),
            attempts: AtomicU64::new(0),
            mismatches: AtomicU64::new(0),
            fetch_failures: AtomicU64::new(0),
            sampler,
        }
    }

    /// Current sampling ratio in `[0, 1]`.
    pub fn ratio(&self) -> f64 {
        f64::from_bits(self.ratio_bits.load(Ordering::Relaxed))
    }

    /// Updates the sampling ratio. Out-of-range values are clamped.
    pub fn set_ratio(&self, ratio: f64) {
        self.ratio_bits
            .store(clamp_ratio(ratio).to_bits(), Ordering::Relaxed);
    }

    /// Total audited hits.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Total audits whose backend row disagreed with the cached payload.
    pub fn mismatches(&self) -> u64 {
        self.mismatches.load(Ordering::Relaxed)
    }

    /// Total audits abandoned because the backend re-fetch failed.
    pub fn fetch_failures(&self) -> u64 {
        self.fetch_failures.load(Ordering::Relaxed)
    }

    /// Audits a cache hit when the per-hit uniform draw falls under the
    /// current ratio. Invoked on the hot path after every hit; the sampled
    /// re-fetch and comparison never propagate an error.
    pub fn maybe_verify(
        &self,
        backend: &dyn RowBackend,
        store: &RowStore,
        table: &TableName,
        pk: &[Value],
        key: &RowKey,
        cached: &EntryView,
    ) {
        let ratio = self.ratio();
        if ratio <= 0.0 || self.sampler.draw() >= ratio {
            return;
        }
        self.attempts.fetch_add(1, Ordering::Relaxed);

        let fresh = match backend.fetch_row(table, pk) {
            Ok(fresh) => fresh,
            Err(err) => {
                self.fetch_failures.fetch_add(1, Ordering::Relaxed);
                log::warn!("spot check re-fetch failed for table '{}': {}", table, err);
                return;
            }
        };

        match fresh {
            Some(row) => {
                let payload = match row.to_payload() {
                    Ok(p) => p,
                    Err(err) => {
                        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
                        log::warn!("spot check could not serialize fresh row: {}", err);
                        return;
                    }
                };
                if payload.as_slice() != &*cached.payload {
                    self.mismatches.fetch_add(1, Ordering::Relaxed);
                    log::warn!(
                        "spot check mismatch on table '{}': cached row diverged from backend",
                        table
                    );
                    // Self-heal, but only if no write beat the audit to it.
                    store.replace_if_generation(table, key, payload.into(), cached.generation);
                }
            }
            None => {
                // Row vanished from the backend while still cached.
                self.mismatches.fetch_add(1, Ordering::Relaxed);
                log::warn!(
                    "spot check mismatch on table '{}': cached row no longer exists",
                    table
                );
                store.delete(table, key);
            }
        }
    }
}

fn clamp_ratio(ratio: f64) -> f64 {
    if ratio.is_nan() {
        0.0
    } else {
        ratio.clamp(0.0, 1.0)
    }
}
