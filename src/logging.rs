//! Logging subscriber initialisation.

use std::io;

use thiserror::Error;
use tracing_subscriber::{
    EnvFilter, Registry,
    filter::ParseError,
    layer::{Layer, SubscriberExt},
    util::{SubscriberInitExt, TryInitError},
};

use crate::config::{LogFormat, LoggingConfig};

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The filter directives do not parse.
    #[error("invalid log filter `{directives}`")]
    Filter {
        /// Directives as configured
        directives: String,

        /// Parser error
        #[source]
        source: ParseError,
    },

    /// A global subscriber was already installed.
    #[error("failed to install tracing subscriber")]
    Init(#[from] TryInitError),
}

/// Install the global `tracing` subscriber, writing to stderr.
///
/// # Errors
///
/// Returns an error if the filter directives are invalid or a global
/// subscriber has already been installed.
pub fn init(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = build_filter(config)?;

    match config.log_format {
        LogFormat::Compact => install(
            filter,
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(io::stderr)
                .with_target(true),
        ),
        LogFormat::Json => install(
            filter,
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_current_span(true)
                .with_span_list(false)
                .with_target(true),
        ),
    }
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    let directives = config.directives();

    EnvFilter::try_new(&directives).map_err(|source| LoggingError::Filter { directives, source })
}

fn install<L>(filter: EnvFilter, fmt_layer: L) -> Result<(), LoggingError>
where
    L: Layer<Registry> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use tracing::Level;

    use super::*;

    fn config(log_filter: Option<&str>) -> LoggingConfig {
        LoggingConfig {
            log_level: Level::INFO,
            log_filter: log_filter.map(str::to_string),
            log_format: LogFormat::Compact,
        }
    }

    #[test]
    fn default_directives_parse() {
        assert!(build_filter(&config(None)).is_ok());
    }

    #[test]
    fn malformed_filter_is_reported() {
        let result = build_filter(&config(Some("bazaar=loud")));

        assert!(
            matches!(&result, Err(LoggingError::Filter { directives, .. }) if directives == "bazaar=loud"),
            "expected a filter error, got {result:?}"
        );
    }
}
