//! Settings Document Module
//!
//! The key-value configuration document the cache is stored in. Keys are
//! dotted paths into nested JSON tables, so `cache.locations` lives under
//! the `cache` table next to unrelated top-level settings.

mod json;

use serde_json::{Map, Value};

use crate::error::Result;

pub use json::JsonDocument;

/// Separator between the segments of a dotted document key.
pub const KEY_SEPARATOR: char = '.';

// == Config Document ==
/// A persistent configuration document of nested string keys to arbitrary values.
pub trait ConfigDocument {
    /// Returns the value stored at the dotted key, if any.
    fn get(&self, key: &str) -> Option<Value>;

    /// Stores a value at the dotted key, creating intermediate tables.
    fn set(&mut self, key: &str, value: Value);

    /// Returns a deep snapshot of the whole document.
    fn all_settings(&self) -> Map<String, Value>;

    /// Replaces the whole document with a serialized JSON object.
    fn read_config(&mut self, serialized: &str) -> Result<()>;

    /// Removes a single dotted key in place.
    ///
    /// Returns `None` when the document has no partial-delete primitive, in
    /// which case callers rewrite the whole document instead.
    fn delete(&mut self, _key: &str) -> Option<bool> {
        None
    }

    /// Persists the document. Memory-only documents have nothing to write.
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

// == Path Helpers ==
/// Looks up a dotted key inside a nested table.
pub fn lookup_path<'a>(root: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    let mut segments = key.split(KEY_SEPARATOR);
    let mut current = root.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Inserts a value at a dotted key, replacing any scalar standing on the path.
pub fn insert_path(root: &mut Map<String, Value>, key: &str, value: Value) {
    let (parents, leaf) = match key.rsplit_once(KEY_SEPARATOR) {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, key),
    };

    let mut table = root;
    for segment in parents.into_iter().flat_map(|p| p.split(KEY_SEPARATOR)) {
        let slot = table
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Some(map) = slot.as_object_mut() else {
            return;
        };
        table = map;
    }
    table.insert(leaf.to_string(), value);
}

/// Removes a dotted key from a nested table, returning the removed value.
pub fn remove_path(root: &mut Map<String, Value>, key: &str) -> Option<Value> {
    match key.rsplit_once(KEY_SEPARATOR) {
        None => root.remove(key),
        Some((parents, leaf)) => {
            let mut table = root;
            for segment in parents.split(KEY_SEPARATOR) {
                table = table.get_mut(segment)?.as_object_mut()?;
            }
            table.remove(leaf)
        }
    }
}
