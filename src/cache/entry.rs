//! Cache Entry Module
//!
//! Defines the persisted shape of a cached value and the key namespacing rule.

use chrono::Utc;
use serde::{Deserialize, Serialize};

// == Key Namespacing ==
/// Prefix separating cache entries from the other settings in the document.
pub const CACHE_KEY_PREFIX: &str = "cache.";

/// Returns the namespaced document key for a logical cache key.
///
/// Dots in `key` would become nested tables; the store operations reject
/// such keys before namespacing them.
pub fn cache_key(key: &str) -> String {
    format!("{CACHE_KEY_PREFIX}{key}")
}

// == Cache Entry ==
/// A single cached value together with its expiration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// Expiration timestamp (Unix seconds), 0 = never expires
    pub expiration: i64,
    /// The cached value
    pub data: T,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates an entry that expires `ttl_seconds` after `now`.
    ///
    /// A TTL of zero produces an entry that never expires.
    pub fn new_at(data: T, ttl_seconds: u64, now: i64) -> Self {
        let expiration = if ttl_seconds > 0 {
            now.saturating_add(i64::try_from(ttl_seconds).unwrap_or(i64::MAX))
        } else {
            0
        };
        Self { expiration, data }
    }

    // == Is Expired ==
    /// Checks whether the entry is expired at `now`.
    ///
    /// Boundary condition: an entry whose expiration equals `now` is still
    /// fresh. It becomes expired one second later.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expiration != 0 && self.expiration < now
    }

    /// Returns remaining TTL in seconds, or None if the entry never expires.
    pub fn ttl_remaining_at(&self, now: i64) -> Option<u64> {
        if self.expiration == 0 {
            return None;
        }
        Some(u64::try_from(self.expiration.saturating_sub(now)).unwrap_or(0))
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in seconds.
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}
