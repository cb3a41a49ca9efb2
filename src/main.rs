//! Settings Cache - cache inspector
//!
//! Prints the state of every cache entry stored in the settings file.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use settings_cache::{Config, Settings};

/// Entry point for the `settings-cache` inspector.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the settings document
/// 4. Print the status of every cached entry as JSON
fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "settings_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: settings_path={}, auto_flush={}",
        config.settings_path.display(),
        config.auto_flush
    );

    let settings = Settings::from_config(&config).with_context(|| {
        format!(
            "failed to open settings file {}",
            config.settings_path.display()
        )
    })?;

    let status = settings.cache_status();
    info!("Found {} cache entries", status.len());

    let report = serde_json::to_string_pretty(&status).context("failed to render cache status")?;
    println!("{report}");

    Ok(())
}
