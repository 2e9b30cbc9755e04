//! Error types for the fieldmodel core library
//!
//! This module defines the error handling system for fieldmodel, using
//! thiserror for error definitions and anyhow for wrapping failures raised
//! inside user-supplied hooks.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main error type for fieldmodel operations
#[derive(Error, Debug)]
pub enum Error {
    /// A value did not match the declared model of a field (strict diagnostics)
    #[error("Type mismatch for field \"{field}\": expected {expected}, got [object {actual}]")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    /// Direct write to a computed or read-only field
    #[error("Field \"{field}\" is read-only")]
    ReadonlyField { field: String },

    /// Engine configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Errors in a serialized schema declaration
    #[error("Declaration error: {message}")]
    Declaration {
        message: String,
        schema: Option<String>,
    },

    /// A deferred schema reference was used before it was filled, or after its schema was dropped
    #[error("Unresolved schema reference: {name}")]
    UnresolvedSchema { name: String },

    /// Nested schema ingestion or extraction went deeper than the recursion guard allows
    #[error("Nesting depth exceeded {limit} in schema {schema}")]
    NestingTooDeep { schema: String, limit: usize },

    /// A user-supplied parse/convert/setter hook failed
    #[error("Hook failed for field \"{field}\": {message}")]
    Hook {
        field: String,
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// YAML parsing errors
    #[error("YAML error: {message}")]
    Yaml {
        message: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create a declaration error, optionally scoped to a schema name
    pub fn declaration(message: impl Into<String>, schema: Option<&str>) -> Self {
        Error::Declaration {
            message: message.into(),
            schema: schema.map(str::to_string),
        }
    }

    /// Create a hook error without an underlying cause
    pub fn hook(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Hook {
            field: field.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an arbitrary failure raised inside a hook
    pub fn hook_source(field: impl Into<String>, source: anyhow::Error) -> Self {
        Error::Hook {
            field: field.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Whether this error came from a strict type check
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Error::TypeMismatch { .. })
    }
}

/// Diagnostic levels for type checks during ingestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Diagnostics {
    /// No type checks
    #[default]
    Silent,
    /// Log a warning on mismatch and keep coercing
    Warn,
    /// Abort the ingestion call on mismatch
    Strict,
}

impl Diagnostics {
    /// Resolve the level from the debug/strict toggles. Strict wins.
    pub fn from_flags(debug: bool, strict: bool) -> Self {
        match (debug, strict) {
            (_, true) => Diagnostics::Strict,
            (true, false) => Diagnostics::Warn,
            (false, false) => Diagnostics::Silent,
        }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostics::Silent => write!(f, "Silent"),
            Diagnostics::Warn => write!(f, "Warn"),
            Diagnostics::Strict => write!(f, "Strict"),
        }
    }
}

// Conversion implementations
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Yaml {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}
