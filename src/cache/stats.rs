//! Cache Statistics Module
//!
//! Counts lookup outcomes so the causes of a miss stay visible in diagnostics.

use serde::Serialize;

use crate::error::CacheError;

// == Cache Stats ==
/// Tracks cache lookup outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups that returned a fresh value
    pub hits: u64,
    /// Lookups that found nothing usable (decode failure or expiry)
    pub misses: u64,
    /// Misses caused by an entry past its TTL
    pub expired: u64,
    /// Misses caused by an absent or malformed entry
    pub decode_errors: u64,
    /// Successful invalidations
    pub invalidations: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Increments the hit counter.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    /// Records a failed lookup, classified by its cause.
    pub fn record_miss(&mut self, cause: &CacheError) {
        self.misses += 1;
        match cause {
            CacheError::Expired(_) => self.expired += 1,
            CacheError::Decode { .. } => self.decode_errors += 1,
            _ => {}
        }
    }

    /// Increments the invalidation counter.
    pub fn record_invalidation(&mut self) {
        self.invalidations += 1;
    }
}
