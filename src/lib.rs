//! Settings Cache - TTL cache stored inside a settings document
//!
//! Keeps values such as the database name list and the region list in the
//! client's settings file so they are not refetched on every invocation.

pub mod cache;
pub mod config;
pub mod document;
pub mod error;
pub mod settings;

pub use config::Config;
pub use document::{ConfigDocument, JsonDocument};
pub use error::{CacheError, Result};
pub use settings::Settings;
