//! Error types and handling for the CLI
//!
//! Every failure maps onto one of a handful of exit codes so scripts can tell
//! a bad invocation from a bad declaration or a bad record.

use std::io;
use std::path::PathBuf;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// File not found
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// The declaration document could not be loaded
    #[error("Failed to load schemas from {}: {source}", path.display())]
    Declaration {
        path: PathBuf,
        #[source]
        source: fieldmodel_core::Error,
    },

    /// The requested schema is not declared
    #[error("Schema '{name}' not found (declared: {})", available.join(", "))]
    SchemaNotFound { name: String, available: Vec<String> },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument combination
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// Input record could not be read as JSON or YAML
    #[error("Invalid input {}: {message}", path.display())]
    InvalidInput { path: PathBuf, message: String },

    /// Error raised by the engine while handling a record
    #[error("{0}")]
    Core(#[from] fieldmodel_core::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error with context
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid arguments error
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs(message.into())
    }

    /// Create a generic error with message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    ///
    /// `1` general, `2` usage, `3` I/O, `4` declaration or configuration,
    /// `5` data or type error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Other { .. } | Self::Json(_) | Self::Yaml(_) => 1,
            Self::InvalidArgs(_) | Self::SchemaNotFound { .. } => 2,
            Self::Io(_) | Self::FileNotFound { .. } => 3,
            Self::Declaration { .. } | Self::Config(_) => 4,
            Self::InvalidInput { .. } => 5,
            Self::Core(core) => match core {
                fieldmodel_core::Error::Io { .. } => 3,
                fieldmodel_core::Error::Configuration { .. }
                | fieldmodel_core::Error::Declaration { .. }
                | fieldmodel_core::Error::UnresolvedSchema { .. } => 4,
                _ => 5,
            },
        }
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(self, Self::InvalidArgs(_) | Self::SchemaNotFound { .. })
    }
}

/// Format an error for display to the user
pub fn format_error(error: &Error, use_color: bool) -> String {
    if use_color {
        use colored::Colorize;
        format!("{} {}", "Error:".red().bold(), error)
    } else {
        format!("Error: {}", error)
    }
}
