//! Cache Module
//!
//! TTL cache entries stored inside a settings document.

mod entry;
mod stats;
mod store;


// Re-export public types
pub use entry::{cache_key, unix_now, CacheEntry, CACHE_KEY_PREFIX};
pub use stats::CacheStats;
pub use store::{
    get_cache, get_cache_at, get_cache_entry, invalidate_cache, set_cache, set_cache_at,
};
