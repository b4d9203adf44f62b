//! Tracing subscriber setup.

use anyhow::Context;
use recond_core::config::LoggingConfig;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if let Some(path) = &config.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("cannot open log file {}", path.display()))?;
        builder.with_writer(Arc::new(file)).with_ansi(false).init();
        return Ok(());
    }

    match config.format.as_str() {
        "pretty" => builder.pretty().init(),
        "json" => builder.json().init(),
        _ => builder.compact().init(),
    }
    Ok(())
}
