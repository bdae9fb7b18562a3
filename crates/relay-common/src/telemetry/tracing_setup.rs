//! Tracing and logging setup
//!
//! One global subscriber: an `EnvFilter` (honoring `RUST_LOG`) in front of a
//! fmt layer that writes either JSON lines or human-readable text.

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Tracing configuration options
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Fallback filter directive when `RUST_LOG` is unset
    pub filter: String,
    /// Output encoding
    pub format: LogFormat,
    /// Include source file and line in each event
    pub source_location: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Pretty,
            source_location: true,
        }
    }
}

impl TracingConfig {
    /// Derive tracing options from the application's logging section
    #[must_use]
    pub fn from_logging(logging: &LoggingConfig) -> Self {
        Self {
            filter: logging.level.clone(),
            format: logging.format,
            source_location: logging.format == LogFormat::Pretty,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.filter))
    }
}

/// Try to initialize tracing with the default text output
pub fn try_init_tracing() -> Result<(), TracingError> {
    try_init_tracing_with_config(TracingConfig::default())
}

/// Try to initialize tracing with custom configuration
///
/// Fails instead of panicking when a global subscriber is already set.
pub fn try_init_tracing_with_config(config: TracingConfig) -> Result<(), TracingError> {
    let (json_layer, text_layer) = match config.format {
        LogFormat::Json => (
            Some(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_file(config.source_location)
                    .with_line_number(config.source_location),
            ),
            None,
        ),
        LogFormat::Pretty => (
            None,
            Some(
                fmt::layer()
                    .with_file(config.source_location)
                    .with_line_number(config.source_location),
            ),
        ),
    };

    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .map_err(|_| TracingError::AlreadyInitialized)
}

/// Tracing initialization errors
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("Tracing subscriber already initialized")]
    AlreadyInitialized,
}
