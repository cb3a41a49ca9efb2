//! Configuration Module
//!
//! Handles loading the settings cache configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Default location of the settings document.
pub const DEFAULT_SETTINGS_PATH: &str = "settings.json";

/// Runtime configuration for the settings cache.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the JSON settings document holding the cache
    pub settings_path: PathBuf,
    /// Write the document back to disk after every cache mutation
    pub auto_flush: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SETTINGS_CACHE_PATH` - Settings document path (default: settings.json)
    /// - `SETTINGS_CACHE_AUTO_FLUSH` - Flush after each mutation (default: true)
    pub fn from_env() -> Self {
        Self {
            settings_path: env::var("SETTINGS_CACHE_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH)),
            auto_flush: env::var("SETTINGS_CACHE_AUTO_FLUSH")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(true),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settings_path: PathBuf::from(DEFAULT_SETTINGS_PATH),
            auto_flush: true,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
