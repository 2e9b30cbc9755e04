//! Configuration management for the CLI
//!
//! Configuration is read from the first file found among:
//! - an explicit `--config` path (or `FIELDMODEL_CONFIG`)
//! - `fieldmodel.yaml` or `.fieldmodel.yaml` in the current directory
//! - `~/.config/fieldmodel/config.yaml`
//!
//! Command-line flags override whatever the file sets.

use crate::cli::OutputFormat;
use crate::error::{Error, Result};
use fieldmodel_core::{EngineConfig, LabelEnumFactory};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Engine defaults applied to every loaded schema
    pub defaults: EngineDefaults,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineDefaults {
    /// Warn about values that do not match their field model
    pub debug: bool,

    /// Fail on values that do not match their field model
    pub strict: bool,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format
    pub format: OutputFormat,

    /// Use colored output when the terminal supports it
    pub color: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    pub level: Option<String>,

    /// Log format (compact, full, json)
    pub format: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Human,
            color: true,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;

        let config = if path.extension().and_then(|s| s.to_str()) == Some("json") {
            serde_json::from_str(&content)
                .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))?
        } else {
            serde_yaml::from_str(&content)
                .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))?
        };

        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                tracing::debug!(path = %path.display(), "Loading configuration");
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        if let Some(path) = file {
            Self::from_file(path)
        } else {
            Self::load()
        }
    }

    /// Get default configuration file paths to check
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from("fieldmodel.yaml"),
            PathBuf::from(".fieldmodel.yaml"),
        ];

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".config").join("fieldmodel").join("config.yaml"));
        }

        paths
    }

    /// Engine configuration for schemas loaded by this run
    ///
    /// The bundled label factory is always installed so `inspect` can show
    /// enum labels.
    pub fn engine(&self) -> Arc<EngineConfig> {
        EngineConfig::new()
            .debug(self.defaults.debug)
            .strict(self.defaults.strict)
            .with_enum_factory(LabelEnumFactory)
            .into_shared()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_file(suffix: &str) -> NamedTempFile {
        tempfile::Builder::new()
            .suffix(suffix)
            .tempfile()
            .expect("temp file")
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.output.format, OutputFormat::Human);
        assert!(config.output.color);
        assert!(!config.defaults.strict);
        assert_eq!(config.logging.level, None);
    }

    #[test]
    fn test_partial_yaml_file() {
        let mut file = temp_file(".yaml");
        writeln!(
            file,
            "defaults:\n  strict: true\noutput:\n  format: json-pretty\nlogging:\n  level: debug"
        )
        .expect("write config");

        let config = Config::from_file(file.path()).expect("load");
        assert!(config.defaults.strict);
        assert!(!config.defaults.debug);
        assert_eq!(config.output.format, OutputFormat::JsonPretty);
        assert!(config.output.color);
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_json_file() {
        let mut file = temp_file(".json");
        write!(file, r#"{{"output": {{"color": false}}}}"#).expect("write config");

        let config = Config::from_file(file.path()).expect("load");
        assert!(!config.output.color);
        assert_eq!(config.output.format, OutputFormat::Human);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let mut file = temp_file(".yaml");
        writeln!(file, "output:\n  format: sparkles").expect("write config");

        let err = Config::from_file(file.path()).expect_err("unknown format");
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = Config::load_with_file(Some(Path::new("/nonexistent/fieldmodel.yaml")))
            .expect_err("missing");
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[test]
    fn test_engine_defaults_flow_into_engine_config() {
        let config = Config {
            defaults: EngineDefaults {
                debug: true,
                strict: true,
            },
            ..Config::default()
        };
        let engine = config.engine();
        assert_eq!(engine.diagnostics(), fieldmodel_core::Diagnostics::Strict);
        assert!(engine.enum_factory.is_some());
    }
}
