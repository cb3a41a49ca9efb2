//! Error types for the settings cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache and settings document operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key absent from the document, or its value does not match the expected shape
    #[error("failed to get cache data for {key}: {reason}")]
    Decode { key: String, reason: String },

    /// Logical key cannot be namespaced as a single document entry
    #[error("invalid cache key: {0}")]
    InvalidKey(String),

    /// Value present but past its TTL
    #[error("cache entry expired: {0}")]
    Expired(String),

    /// Value could not be turned into a document value
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Serialized document could not be loaded back into the store
    #[error("failed to reload settings: {0}")]
    Reload(String),

    /// Settings file could not be read or written
    #[error("settings file I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl CacheError {
    /// Builds a decode error for the given logical key.
    pub fn decode(key: impl Into<String>, reason: impl Into<String>) -> Self {
        CacheError::Decode {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for the two causes a caller treats as a cache miss.
    pub fn is_miss(&self) -> bool {
        matches!(self, CacheError::Decode { .. } | CacheError::Expired(_))
    }
}

// == Result Type Alias ==
/// Convenience Result type for the settings cache.
pub type Result<T> = std::result::Result<T, CacheError>;
