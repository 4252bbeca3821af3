//! Structured logging using the tracing crate.
//!
//! Logs go to stderr so command output on stdout stays machine-readable.
//! `RUST_LOG` always wins over the level picked here.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{Error, Result};

/// Builder for the global subscriber.
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    config: LoggingConfig,
    verbosity: u8,
    ansi: bool,
}

impl LoggingBuilder {
    /// Start from a logging config.
    pub fn from_config(config: LoggingConfig) -> Self {
        Self {
            config,
            verbosity: 0,
            ansi: true,
        }
    }

    /// Raise the level by `-v` count.
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set the log format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.config.format = format;
        self
    }

    /// Set ANSI colors.
    pub fn with_ansi(mut self, enabled: bool) -> Self {
        self.ansi = enabled;
        self
    }

    /// Level directive from verbosity, falling back to the configured level.
    pub fn level(&self) -> &str {
        match self.verbosity {
            0 => self.config.level.as_str(),
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    fn build_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(self.level()))
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    }

    /// Install the global subscriber.
    pub fn init(self) -> Result<()> {
        let env_filter = self.build_filter();
        let with_target = self.verbosity >= 3;

        let registry = tracing_subscriber::registry().with(env_filter);
        let result = match self.config.format {
            LogFormat::Pretty => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(std::io::stderr)
                        .with_ansi(self.ansi)
                        .with_target(with_target),
                )
                .try_init(),
            LogFormat::Compact => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_writer(std::io::stderr)
                        .with_ansi(self.ansi)
                        .with_target(with_target),
                )
                .try_init(),
            LogFormat::Json => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(with_target),
                )
                .try_init(),
        };

        result.map_err(|e| Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_verbosity() {
        let builder = LoggingBuilder::from_config(LoggingConfig::default());
        assert_eq!(builder.level(), "warn");
        assert_eq!(builder.clone().with_verbosity(1).level(), "info");
        assert_eq!(builder.clone().with_verbosity(2).level(), "debug");
        assert_eq!(builder.with_verbosity(7).level(), "trace");
    }

    #[test]
    fn test_configured_level_applies_without_flags() {
        let config = LoggingConfig {
            level: "error".to_string(),
            ..LoggingConfig::default()
        };
        assert_eq!(LoggingBuilder::from_config(config).level(), "error");
    }
}
