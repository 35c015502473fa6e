//! Logging Config

use clap::Args;
use tracing::Level;

/// Log output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs, one object per line.
    Json,
}

/// Logging settings. Logs go to stderr so command output on stdout stays
/// clean.
#[derive(Debug, Clone, Args)]
pub struct LoggingConfig {
    /// Level for bazaar's own events; dependencies log warnings only
    #[arg(short, long, env = "BAZAAR_LOG_LEVEL", default_value_t = Level::INFO)]
    pub log_level: Level,

    /// Raw filter directives, replacing the level above when set
    #[arg(long, env = "RUST_LOG")]
    pub log_filter: Option<String>,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

impl LoggingConfig {
    /// Filter directives for the subscriber.
    pub fn directives(&self) -> String {
        match &self.log_filter {
            Some(filter) if !filter.trim().is_empty() => filter.clone(),
            _ => format!("warn,bazaar={}", self.log_level),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(log_level: Level, log_filter: Option<&str>) -> LoggingConfig {
        LoggingConfig {
            log_level,
            log_filter: log_filter.map(str::to_string),
            log_format: LogFormat::Compact,
        }
    }

    #[test]
    fn level_applies_to_bazaar_only() {
        assert_eq!(config(Level::DEBUG, None).directives(), "warn,bazaar=DEBUG");
    }

    #[test]
    fn explicit_filter_wins() {
        let config = config(Level::DEBUG, Some("bazaar::chat=trace"));

        assert_eq!(config.directives(), "bazaar::chat=trace");
    }

    #[test]
    fn blank_filter_falls_back_to_level() {
        assert_eq!(config(Level::INFO, Some("  ")).directives(), "warn,bazaar=INFO");
    }
}
