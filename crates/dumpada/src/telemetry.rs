//! Logging setup.
//!
//! Installs a global `tracing` subscriber and bridges `log` records (emitted
//! by the database layer) into it.

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("Logging is already initialized")]
    AlreadyInitialized,
}

/// Builds the level filter: `RUST_LOG` wins, then the configured level.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level).map_err(|e| TelemetryError::InvalidFilter {
        filter: config.level.clone(),
        reason: e.to_string(),
    })
}

/// Installs the global subscriber. Only the first call in a process
/// succeeds; later calls return [`TelemetryError::AlreadyInitialized`].
pub fn init_logging(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let filter = build_filter(config)?;

    let installed = if config.json {
        tracing::subscriber::set_global_default(
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json()),
        )
    } else {
        tracing::subscriber::set_global_default(
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer()),
        )
    };
    installed.map_err(|_| TelemetryError::AlreadyInitialized)?;

    tracing_log::LogTracer::init().map_err(|_| TelemetryError::AlreadyInitialized)?;

    tracing::debug!(json = config.json, level = %config.level, "Logging initialized");
    Ok(())
}
