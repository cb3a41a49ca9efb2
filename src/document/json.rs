//! JSON Settings Document
//!
//! In-memory nested JSON document, optionally bound to a file on disk.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::document::{insert_path, lookup_path, remove_path, ConfigDocument};
use crate::error::{CacheError, Result};

// == Json Document ==
/// Settings document backed by a JSON object.
#[derive(Debug, Clone, Default)]
pub struct JsonDocument {
    /// Top-level settings table
    root: Map<String, Value>,
    /// File the document is flushed to, if any
    path: Option<PathBuf>,
}

impl JsonDocument {
    // == Constructors ==
    /// Creates an empty, memory-only document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a memory-only document from an existing table.
    pub fn from_map(root: Map<String, Value>) -> Self {
        Self { root, path: None }
    }

    /// Opens the document stored at `path`.
    ///
    /// A missing file yields an empty document that will be created on the
    /// first flush.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut document = Self {
            root: Map::new(),
            path: Some(path.clone()),
        };

        match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => {
                debug!("Settings file {} is empty", path.display());
            }
            Ok(contents) => {
                document.read_config(&contents)?;
                debug!("Loaded settings from {}", path.display());
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("Settings file {} not found, starting empty", path.display());
            }
            Err(err) => return Err(err.into()),
        }

        Ok(document)
    }

    /// Returns the file this document is bound to.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Serializes the whole document as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.root)?)
    }
}

impl ConfigDocument for JsonDocument {
    fn get(&self, key: &str) -> Option<Value> {
        lookup_path(&self.root, key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        insert_path(&mut self.root, key, value);
    }

    fn all_settings(&self) -> Map<String, Value> {
        self.root.clone()
    }

    fn read_config(&mut self, serialized: &str) -> Result<()> {
        let parsed: Value =
            serde_json::from_str(serialized).map_err(|e| CacheError::Reload(e.to_string()))?;

        match parsed {
            Value::Object(root) => {
                self.root = root;
                Ok(())
            }
            other => Err(CacheError::Reload(format!(
                "expected a JSON object at the document root, found {}",
                value_kind(&other)
            ))),
        }
    }

    fn delete(&mut self, key: &str) -> Option<bool> {
        Some(remove_path(&mut self.root, key).is_some())
    }

    // == Flush ==
    /// Writes the whole document back to its file.
    ///
    /// Memory-only documents have nothing to flush.
    fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            debug!("Settings document is memory-only, skipping flush");
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut contents = self.to_json_string()?;
        contents.push('\n');
        fs::write(path, contents)?;

        info!("Settings flushed to {}", path.display());
        Ok(())
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
