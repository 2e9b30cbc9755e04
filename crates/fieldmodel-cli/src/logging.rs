//! Logging setup for the fieldmodel CLI
//!
//! Installs a `tracing-subscriber` formatter. The engine logs diagnostics
//! through the `log` facade; `try_init` also installs the log bridge so those
//! records reach the same subscriber.

use crate::config::LoggingConfig as FileLoggingConfig;
use crate::error::{Error, Result};
use is_terminal::IsTerminal;
use std::time::Instant;
use tracing::Span;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Resolved logging configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Log level filter
    pub level: String,
    /// Output format: compact, full, json
    pub format: LogFormat,
    /// Include timestamps
    pub timestamps: bool,
    /// Include file and line numbers
    pub source_location: bool,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact format for everyday use
    Compact,
    /// Full format with all details
    Full,
    /// JSON structured format
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "full" => Ok(LogFormat::Full),
            "json" => Ok(LogFormat::Json),
            other => Err(Error::config(format!("invalid log format '{}'", other))),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
            timestamps: false,
            source_location: false,
        }
    }
}

impl LoggingConfig {
    /// Create logging config from verbosity level
    pub fn from_verbosity(verbosity: u8) -> Self {
        let mut config = Self::default();

        match verbosity {
            0 => {}
            1 => {
                config.level = "info".to_string();
            }
            2 => {
                config.level = "debug".to_string();
                config.source_location = true;
            }
            _ => {
                config.level = "trace".to_string();
                config.format = LogFormat::Full;
                config.source_location = true;
                config.timestamps = true;
            }
        }

        config
    }

    /// Apply the `logging` section of the configuration file
    ///
    /// A file level only applies when no `-v` flag raised the level.
    pub fn merge_with_file(&mut self, file: &FileLoggingConfig, verbosity: u8) -> Result<()> {
        if verbosity == 0 {
            if let Some(level) = &file.level {
                self.level = level.clone();
            }
        }
        if let Some(format) = &file.format {
            self.format = format.parse()?;
        }
        Ok(())
    }

    /// Apply environment overrides
    pub fn merge_with_env(&mut self) {
        self.apply_env(
            std::env::var("RUST_LOG").ok(),
            std::env::var("FIELDMODEL_LOG_FORMAT").ok(),
            std::env::var("FIELDMODEL_LOG_TIMESTAMPS").ok(),
        );
    }

    fn apply_env(&mut self, rust_log: Option<String>, format: Option<String>, timestamps: Option<String>) {
        // RUST_LOG takes precedence
        if let Some(rust_log) = rust_log {
            self.level = rust_log;
        }

        if let Some(format) = format {
            match format.parse() {
                Ok(format) => self.format = format,
                Err(_) => eprintln!("Warning: invalid FIELDMODEL_LOG_FORMAT '{}', using default", format),
            }
        }

        if let Some(timestamps) = timestamps {
            self.timestamps = timestamps.eq_ignore_ascii_case("true") || timestamps == "1";
        }
    }
}

/// Initialize the global logging system
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_new(&config.level)
        .map_err(|e| Error::config(format!("invalid log filter '{}': {}", config.level, e)))?;
    let ansi = std::io::stderr().is_terminal();

    // Each format yields a distinct subscriber type
    let installed = match (config.format, config.timestamps) {
        (LogFormat::Compact, true) => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_ansi(ansi)
            .with_file(config.source_location)
            .with_line_number(config.source_location)
            .compact()
            .finish()
            .try_init(),
        (LogFormat::Compact, false) => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_ansi(ansi)
            .with_file(config.source_location)
            .with_line_number(config.source_location)
            .without_time()
            .compact()
            .finish()
            .try_init(),
        (LogFormat::Full, true) => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_ansi(ansi)
            .with_thread_ids(true)
            .with_file(config.source_location)
            .with_line_number(config.source_location)
            .finish()
            .try_init(),
        (LogFormat::Full, false) => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_ansi(ansi)
            .with_thread_ids(true)
            .with_file(config.source_location)
            .with_line_number(config.source_location)
            .without_time()
            .finish()
            .try_init(),
        (LogFormat::Json, _) => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .with_file(config.source_location)
            .with_line_number(config.source_location)
            .json()
            .finish()
            .try_init(),
    };
    installed.map_err(|e| Error::other(format!("Failed to initialize logging: {}", e)))?;

    tracing::debug!(config = ?config, "Logging system initialized");
    Ok(())
}

/// Span covering one CLI command
pub fn command_span(command: &str, schema: Option<&str>) -> Span {
    tracing::info_span!(
        "command",
        command = command,
        schema = schema.unwrap_or(""),
        duration_ms = tracing::field::Empty,
    )
}

/// Timer that records the duration of a command span when dropped
pub struct Timer {
    start: Instant,
    span: Span,
}

impl Timer {
    pub fn new(span: Span) -> Self {
        Self {
            start: Instant::now(),
            span,
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        self.span.record("duration_ms", duration.as_millis() as u64);
        tracing::debug!(parent: &self.span, duration_ms = duration.as_millis() as u64, "Command finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_from_verbosity() {
        let config = LoggingConfig::from_verbosity(0);
        assert_eq!(config.level, "warn");
        assert!(!config.source_location);

        let config = LoggingConfig::from_verbosity(2);
        assert_eq!(config.level, "debug");
        assert!(config.source_location);

        let config = LoggingConfig::from_verbosity(3);
        assert_eq!(config.level, "trace");
        assert_eq!(config.format, LogFormat::Full);
        assert!(config.timestamps);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = LoggingConfig::default();
        config.apply_env(
            Some("fieldmodel_core=debug".into()),
            Some("JSON".into()),
            Some("1".into()),
        );
        assert_eq!(config.level, "fieldmodel_core=debug");
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.timestamps);

        config.apply_env(None, Some("sparkles".into()), Some("no".into()));
        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.timestamps);
    }

    #[test]
    fn test_file_level_yields_to_verbosity() {
        let file = FileLoggingConfig {
            level: Some("error".into()),
            format: Some("full".into()),
        };

        let mut quiet = LoggingConfig::from_verbosity(0);
        quiet.merge_with_file(&file, 0).expect("merge");
        assert_eq!(quiet.level, "error");
        assert_eq!(quiet.format, LogFormat::Full);

        let mut verbose = LoggingConfig::from_verbosity(2);
        verbose.merge_with_file(&file, 2).expect("merge");
        assert_eq!(verbose.level, "debug");
    }

    #[test]
    fn test_invalid_file_format() {
        let file = FileLoggingConfig {
            level: None,
            format: Some("xml".into()),
        };
        let mut config = LoggingConfig::default();
        assert!(config.merge_with_file(&file, 0).is_err());
    }
}
