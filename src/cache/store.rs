//! Cache Store Module
//!
//! Generic set/get/invalidate operations on top of a settings document.
//! Every entry is stored as a `CacheEntry` under the namespaced key.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::entry::{cache_key, unix_now, CacheEntry};
use crate::document::{remove_path, ConfigDocument, KEY_SEPARATOR};
use crate::error::{CacheError, Result};

// == Key Validation ==
/// Rejects logical keys that would not map to exactly one document entry.
///
/// A separator inside the key would nest the entry under another entry,
/// and invalidating the outer one would silently drop it.
fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey("key cannot be empty".to_string()));
    }
    if key.contains(KEY_SEPARATOR) {
        return Err(CacheError::InvalidKey(format!(
            "key '{key}' must not contain '{KEY_SEPARATOR}'"
        )));
    }
    Ok(())
}

// == Set ==
/// Stores `value` under `key` with a TTL in seconds (0 = never expires).
///
/// An existing entry is overwritten wholesale. Keys must be non-empty and
/// free of the document key separator.
pub fn set_cache<D, T>(doc: &mut D, key: &str, ttl_seconds: u64, value: T) -> Result<()>
where
    D: ConfigDocument + ?Sized,
    T: Serialize,
{
    set_cache_at(doc, key, ttl_seconds, value, unix_now())
}

/// Same as [`set_cache`] with an explicit clock (Unix seconds).
pub fn set_cache_at<D, T>(
    doc: &mut D,
    key: &str,
    ttl_seconds: u64,
    value: T,
    now: i64,
) -> Result<()>
where
    D: ConfigDocument + ?Sized,
    T: Serialize,
{
    validate_key(key)?;
    let entry = CacheEntry::new_at(value, ttl_seconds, now);
    let encoded = serde_json::to_value(&entry)?;
    doc.set(&cache_key(key), encoded);

    debug!(key, expiration = entry.expiration, "Cache entry written");
    Ok(())
}

// == Get ==
/// Returns the fresh value cached under `key`.
///
/// Fails with `CacheError::Decode` when the key is absent or has the wrong
/// shape, and with `CacheError::Expired` when the entry is past its TTL.
pub fn get_cache<D, T>(doc: &D, key: &str) -> Result<T>
where
    D: ConfigDocument + ?Sized,
    T: DeserializeOwned,
{
    get_cache_at(doc, key, unix_now())
}

/// Same as [`get_cache`] with an explicit clock (Unix seconds).
pub fn get_cache_at<D, T>(doc: &D, key: &str, now: i64) -> Result<T>
where
    D: ConfigDocument + ?Sized,
    T: DeserializeOwned,
{
    let entry: CacheEntry<T> = get_cache_entry(doc, key)?;

    if entry.is_expired_at(now) {
        debug!(key, expiration = entry.expiration, now, "Cache entry expired");
        return Err(CacheError::Expired(key.to_string()));
    }

    Ok(entry.data)
}

/// Decodes the raw entry under `key` without checking its freshness.
pub fn get_cache_entry<D, T>(doc: &D, key: &str) -> Result<CacheEntry<T>>
where
    D: ConfigDocument + ?Sized,
    T: DeserializeOwned,
{
    validate_key(key)?;
    let raw = doc
        .get(&cache_key(key))
        .ok_or_else(|| CacheError::decode(key, "missing"))?;

    serde_json::from_value(raw).map_err(|e| CacheError::decode(key, e.to_string()))
}

// == Invalidate ==
/// Removes the entry cached under `key`.
///
/// Uses the document's targeted delete when it has one. Otherwise the whole
/// document is snapshotted, the key dropped from the snapshot, and the store
/// reloaded from the re-serialized snapshot. Writes made to the document
/// between that snapshot and the reload are lost.
pub fn invalidate_cache<D>(doc: &mut D, key: &str) -> Result<()>
where
    D: ConfigDocument + ?Sized,
{
    validate_key(key)?;
    let namespaced = cache_key(key);

    if let Some(removed) = doc.delete(&namespaced) {
        info!(key, removed, "Cache entry invalidated");
        return Ok(());
    }

    let mut snapshot = doc.all_settings();
    let removed = remove_path(&mut snapshot, &namespaced).is_some();
    let encoded = serde_json::to_string_pretty(&snapshot)?;
    doc.read_config(&encoded)?;

    info!(key, removed, "Cache entry invalidated by full document rewrite");
    Ok(())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::JsonDocument;
    use serde_json::{json, Map, Value};
    use std::collections::BTreeMap;

    const NOW: i64 = 1_700_000_000;

    /// Document without a targeted delete, forcing the full-rewrite path.
    #[derive(Default)]
    struct RewriteOnlyDocument {
        inner: JsonDocument,
        reloads: usize,
    }

    impl ConfigDocument for RewriteOnlyDocument {
        fn get(&self, key: &str) -> Option<Value> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: Value) {
            self.inner.set(key, value);
        }

        fn all_settings(&self) -> Map<String, Value> {
            self.inner.all_settings()
        }

        fn read_config(&mut self, serialized: &str) -> Result<()> {
            self.reloads += 1;
            self.inner.read_config(serialized)
        }
    }

    /// Document whose reload fails, to check error propagation.
    #[derive(Default)]
    struct BrokenReloadDocument {
        inner: JsonDocument,
    }

    impl ConfigDocument for BrokenReloadDocument {
        fn get(&self, key: &str) -> Option<Value> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: Value) {
            self.inner.set(key, value);
        }

        fn all_settings(&self) -> Map<String, Value> {
            self.inner.all_settings()
        }

        fn read_config(&mut self, _serialized: &str) -> Result<()> {
            Err(CacheError::Reload("read-only store".to_string()))
        }
    }

    #[test]
    fn test_set_and_get() {
        let mut doc = JsonDocument::new();

        set_cache_at(&mut doc, "names", 60, vec!["a", "b"], NOW).unwrap();
        let value: Vec<String> = get_cache_at(&doc, "names", NOW).unwrap();

        assert_eq!(value, vec!["a", "b"]);
    }

    #[test]
    fn test_set_writes_namespaced_entry() {
        let mut doc = JsonDocument::new();

        set_cache_at(&mut doc, "names", 60, vec!["a"], NOW).unwrap();

        assert_eq!(
            doc.get("cache.names"),
            Some(json!({"expiration": NOW + 60, "data": ["a"]}))
        );
        assert!(doc.get("names").is_none());
    }

    #[test]
    fn test_zero_ttl_never_expires() {
        let mut doc = JsonDocument::new();

        set_cache_at(&mut doc, "forever", 0, "v", NOW).unwrap();

        assert_eq!(doc.get("cache.forever.expiration"), Some(json!(0)));
        let value: String = get_cache_at(&doc, "forever", i64::MAX).unwrap();
        assert_eq!(value, "v");
    }

    #[test]
    fn test_get_nonexistent() {
        let doc = JsonDocument::new();

        let result: Result<Vec<String>> = get_cache(&doc, "nothing");
        assert!(matches!(result, Err(CacheError::Decode { .. })));
    }

    #[test]
    fn test_get_shape_mismatch() {
        let mut doc = JsonDocument::new();
        set_cache_at(&mut doc, "names", 60, "not a list", NOW).unwrap();

        let result: Result<Vec<String>> = get_cache_at(&doc, "names", NOW);
        assert!(matches!(result, Err(CacheError::Decode { .. })));
    }

    #[test]
    fn test_get_raw_value_without_envelope() {
        let mut doc = JsonDocument::new();
        doc.set("cache.names", json!(["a", "b"]));

        let result: Result<Vec<String>> = get_cache_at(&doc, "names", NOW);
        assert!(matches!(result, Err(CacheError::Decode { .. })));
    }

    #[test]
    fn test_expiration_boundary() {
        let mut doc = JsonDocument::new();
        let put = |doc: &mut JsonDocument, expiration: i64| {
            doc.set(
                "cache.k",
                json!({"expiration": expiration, "data": "v"}),
            );
        };

        put(&mut doc, NOW - 1);
        let stale: Result<String> = get_cache_at(&doc, "k", NOW);
        assert!(matches!(stale, Err(CacheError::Expired(_))));

        put(&mut doc, NOW + 1);
        let fresh: Result<String> = get_cache_at(&doc, "k", NOW);
        assert_eq!(fresh.unwrap(), "v");

        put(&mut doc, NOW);
        let exact: Result<String> = get_cache_at(&doc, "k", NOW);
        assert_eq!(exact.unwrap(), "v", "expiration == now is still fresh");
    }

    #[test]
    fn test_expired_entry_stays_in_document() {
        let mut doc = JsonDocument::new();
        set_cache_at(&mut doc, "k", 10, 7u32, NOW).unwrap();

        let result: Result<u32> = get_cache_at(&doc, "k", NOW + 11);
        assert!(matches!(result, Err(CacheError::Expired(_))));

        let entry: CacheEntry<u32> = get_cache_entry(&doc, "k").unwrap();
        assert_eq!(entry.data, 7);
        assert!(entry.is_expired_at(NOW + 11));
    }

    #[test]
    fn test_overwrite_resets_ttl() {
        let mut doc = JsonDocument::new();
        set_cache_at(&mut doc, "k", 10, "old", NOW).unwrap();
        set_cache_at(&mut doc, "k", 100, "new", NOW + 50).unwrap();

        let value: String = get_cache_at(&doc, "k", NOW + 60).unwrap();
        assert_eq!(value, "new");
    }

    #[test]
    fn test_invalidate_then_get_is_miss() {
        let mut doc = JsonDocument::new();
        set_cache_at(&mut doc, "k", 60, "v", NOW).unwrap();

        invalidate_cache(&mut doc, "k").unwrap();

        let result: Result<String> = get_cache_at(&doc, "k", NOW);
        assert!(matches!(result, Err(CacheError::Decode { .. })));
    }

    #[test]
    fn test_invalidate_missing_key_is_ok() {
        let mut doc = JsonDocument::new();
        assert!(invalidate_cache(&mut doc, "never_set").is_ok());
    }

    #[test]
    fn test_invalidate_keeps_other_settings() {
        let mut doc = JsonDocument::new();
        doc.set("token", json!("secret"));
        set_cache_at(&mut doc, "a", 60, 1, NOW).unwrap();
        set_cache_at(&mut doc, "b", 60, 2, NOW).unwrap();

        invalidate_cache(&mut doc, "a").unwrap();

        assert_eq!(doc.get("token"), Some(json!("secret")));
        let b: i32 = get_cache_at(&doc, "b", NOW).unwrap();
        assert_eq!(b, 2);
    }

    #[test]
    fn test_invalidate_falls_back_to_rewrite() {
        let mut doc = RewriteOnlyDocument::default();
        doc.set("token", json!("secret"));
        set_cache_at(&mut doc, "a", 60, 1, NOW).unwrap();
        set_cache_at(&mut doc, "b", 60, 2, NOW).unwrap();

        invalidate_cache(&mut doc, "a").unwrap();

        assert_eq!(doc.reloads, 1);
        assert!(doc.get("cache.a").is_none());
        assert_eq!(doc.get("token"), Some(json!("secret")));
        let b: i32 = get_cache_at(&doc, "b", NOW).unwrap();
        assert_eq!(b, 2);
    }

    #[test]
    fn test_invalidate_propagates_reload_failure() {
        let mut doc = BrokenReloadDocument::default();
        set_cache_at(&mut doc, "a", 60, 1, NOW).unwrap();

        let result = invalidate_cache(&mut doc, "a");
        assert!(matches!(result, Err(CacheError::Reload(_))));
    }

    #[test]
    fn test_map_values_round_trip() {
        let mut doc = JsonDocument::new();
        let mut locations = BTreeMap::new();
        locations.insert("waw".to_string(), "Warsaw".to_string());

        set_cache_at(&mut doc, "locations", 60, &locations, NOW).unwrap();
        let value: BTreeMap<String, String> = get_cache_at(&doc, "locations", NOW).unwrap();

        assert_eq!(value, locations);
    }

    #[test]
    fn test_dotted_key_rejected() {
        let mut doc = JsonDocument::new();
        set_cache_at(&mut doc, "a", 60, 1, NOW).unwrap();

        let result = set_cache_at(&mut doc, "a.b", 60, 2, NOW);
        assert!(matches!(result, Err(CacheError::InvalidKey(_))));

        // Entry "a" was not turned into a table holding "b"
        assert_eq!(doc.get("cache.a"), Some(json!({"expiration": NOW + 60, "data": 1})));

        let read: Result<i32> = get_cache_at(&doc, "a.b", NOW);
        assert!(matches!(read, Err(CacheError::InvalidKey(_))));
        assert!(matches!(
            invalidate_cache(&mut doc, "a.data"),
            Err(CacheError::InvalidKey(_))
        ));
        let a: i32 = get_cache_at(&doc, "a", NOW).unwrap();
        assert_eq!(a, 1);
    }

    #[test]
    fn test_empty_key_rejected() {
        let mut doc = JsonDocument::new();

        let result = set_cache_at(&mut doc, "", 60, 1, NOW);
        assert!(matches!(result, Err(CacheError::InvalidKey(_))));
        assert!(doc.get("cache").is_none());
    }

    #[test]
    fn test_non_string_map_keys_fail_to_serialize() {
        let mut doc = JsonDocument::new();
        let mut bad = BTreeMap::new();
        bad.insert(vec![1u8], "x");

        let result = set_cache_at(&mut doc, "bad", 60, bad, NOW);
        assert!(matches!(result, Err(CacheError::Serialize(_))));
        assert!(doc.get("cache.bad").is_none());
    }
}
