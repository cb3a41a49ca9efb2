//! Settings Module
//!
//! Typed cache accessors for the data the client would otherwise refetch on
//! every invocation: the list of database names and the region list.
//!
//! Every accessor collapses failures into "no cached value". The lookup
//! counters in [`CacheStats`] keep the underlying causes apart.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{
    get_cache_at, invalidate_cache, set_cache_at, unix_now, CacheEntry, CacheStats,
    CACHE_KEY_PREFIX,
};
use crate::config::Config;
use crate::document::{ConfigDocument, JsonDocument};
use crate::error::Result;

// == Cache Keys ==
/// Logical key of the database names cache.
pub const DB_NAMES_CACHE_KEY: &str = "database_names";
/// Database names are refetched after 30 minutes.
pub const DB_NAMES_CACHE_TTL_SECONDS: u64 = 30 * 60;

/// Logical key of the region code to display name mapping.
pub const LOCATIONS_CACHE_KEY: &str = "locations";
/// Logical key of the closest region code.
pub const DEFAULT_LOCATION_CACHE_KEY: &str = "defaultLocation";
/// Regions are refetched after 8 hours.
pub const LOCATIONS_CACHE_TTL_SECONDS: u64 = 8 * 60 * 60;

/// Region code to display name.
pub type Locations = BTreeMap<String, String>;

// == Entry Status ==
/// Freshness of a stored cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    Fresh,
    Expired,
    NeverExpires,
    Malformed,
}

/// Diagnostic view of one entry under the cache namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheEntryStatus {
    /// Logical key (without the namespace prefix)
    pub key: String,
    /// Expiration timestamp (Unix seconds), if the entry has one
    pub expiration: Option<i64>,
    /// Seconds left before expiry
    pub ttl_remaining: Option<u64>,
    pub state: EntryState,
}

// == Settings ==
/// Handle over a settings document exposing the typed caches.
#[derive(Debug)]
pub struct Settings<D = JsonDocument> {
    /// Underlying settings document
    document: D,
    /// Lookup counters
    stats: CacheStats,
    /// Flush the document after every cache mutation
    auto_flush: bool,
    /// Source of the current Unix time
    clock: fn() -> i64,
}

impl Settings<JsonDocument> {
    /// Opens the settings file named by the configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let document = JsonDocument::open(&config.settings_path)?;
        Ok(Self::new(document).with_auto_flush(config.auto_flush))
    }
}

impl<D: ConfigDocument> Settings<D> {
    // == Constructor ==
    /// Wraps a document. Auto flush starts disabled.
    pub fn new(document: D) -> Self {
        Self {
            document,
            stats: CacheStats::new(),
            auto_flush: false,
            clock: unix_now,
        }
    }

    /// Enables or disables flushing after each mutation.
    pub fn with_auto_flush(mut self, auto_flush: bool) -> Self {
        self.auto_flush = auto_flush;
        self
    }

    /// Replaces the clock used for TTL computations.
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    pub fn into_document(self) -> D {
        self.document
    }

    /// Returns the lookup counters.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    // == Database Names ==
    /// Caches the list of database names.
    pub fn set_db_names_cache(&mut self, names: &[String]) {
        self.store(DB_NAMES_CACHE_KEY, DB_NAMES_CACHE_TTL_SECONDS, names);
        self.flush_if_enabled();
    }

    /// Returns the cached database names, or None on any miss.
    pub fn get_db_names_cache(&mut self) -> Option<Vec<String>> {
        self.lookup(DB_NAMES_CACHE_KEY)
    }

    /// Drops the cached database names.
    pub fn invalidate_db_names_cache(&mut self) {
        self.invalidate(DB_NAMES_CACHE_KEY);
        self.flush_if_enabled();
    }

    // == Locations ==
    /// Caches the region list and the closest region.
    ///
    /// The two values are written independently under separate keys.
    pub fn set_locations_cache(&mut self, locations: &Locations, closest: &str) {
        self.store(LOCATIONS_CACHE_KEY, LOCATIONS_CACHE_TTL_SECONDS, locations);
        self.store(DEFAULT_LOCATION_CACHE_KEY, LOCATIONS_CACHE_TTL_SECONDS, closest);
        self.flush_if_enabled();
    }

    /// Returns the cached regions and closest region.
    ///
    /// A miss on either key is a miss for both.
    pub fn locations_cache(&mut self) -> Option<(Locations, String)> {
        let now = (self.clock)();
        let result = get_cache_at::<_, Locations>(&self.document, LOCATIONS_CACHE_KEY, now)
            .and_then(|locations| {
                get_cache_at::<_, String>(&self.document, DEFAULT_LOCATION_CACHE_KEY, now)
                    .map(|closest| (locations, closest))
            });
        self.record_lookup(LOCATIONS_CACHE_KEY, result)
    }

    /// Drops both location keys.
    pub fn invalidate_locations_cache(&mut self) {
        self.invalidate(LOCATIONS_CACHE_KEY);
        self.invalidate(DEFAULT_LOCATION_CACHE_KEY);
        self.flush_if_enabled();
    }

    // == Diagnostics ==
    /// Lists every entry stored under the cache namespace.
    pub fn cache_status(&self) -> Vec<CacheEntryStatus> {
        let now = (self.clock)();
        let namespace = CACHE_KEY_PREFIX.trim_end_matches('.');

        let Some(Value::Object(entries)) = self.document.get(namespace) else {
            return Vec::new();
        };

        entries
            .into_iter()
            .map(|(key, raw)| match serde_json::from_value::<CacheEntry<Value>>(raw) {
                Ok(entry) => {
                    let state = if entry.expiration == 0 {
                        EntryState::NeverExpires
                    } else if entry.is_expired_at(now) {
                        EntryState::Expired
                    } else {
                        EntryState::Fresh
                    };
                    CacheEntryStatus {
                        key,
                        expiration: (entry.expiration != 0).then_some(entry.expiration),
                        ttl_remaining: entry.ttl_remaining_at(now),
                        state,
                    }
                }
                Err(_) => CacheEntryStatus {
                    key,
                    expiration: None,
                    ttl_remaining: None,
                    state: EntryState::Malformed,
                },
            })
            .collect()
    }

    // == Internal Helpers ==
    fn store<T: Serialize + ?Sized>(&mut self, key: &str, ttl_seconds: u64, value: &T) {
        let now = (self.clock)();
        if let Err(err) = set_cache_at(&mut self.document, key, ttl_seconds, value, now) {
            warn!(key, error = %err, "Failed to write cache entry");
        }
    }

    fn lookup<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let result = get_cache_at(&self.document, key, (self.clock)());
        self.record_lookup(key, result)
    }

    /// Counts exactly one hit or one miss for a caller-visible lookup.
    fn record_lookup<T>(&mut self, key: &str, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => {
                self.stats.record_hit();
                debug!(key, "Cache hit");
                Some(value)
            }
            Err(err) => {
                self.stats.record_miss(&err);
                debug!(key, error = %err, "Cache miss");
                None
            }
        }
    }

    fn invalidate(&mut self, key: &str) {
        match invalidate_cache(&mut self.document, key) {
            Ok(()) => self.stats.record_invalidation(),
            Err(err) => warn!(key, error = %err, "Failed to invalidate cache entry"),
        }
    }

    fn flush_if_enabled(&self) {
        if !self.auto_flush {
            return;
        }
        if let Err(err) = self.document.flush() {
            warn!(error = %err, "Failed to flush settings");
        }
    }
}
