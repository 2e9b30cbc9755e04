//! Shared utilities for command handlers

use crate::cli::SchemaArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use fieldmodel_core::{Schema, SchemaRegistry};
use serde_json::Value;
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Load the declaration document named on the command line
pub fn load_registry(args: &SchemaArgs, config: &Config) -> Result<SchemaRegistry> {
    if !args.schemas.exists() {
        return Err(Error::FileNotFound {
            path: args.schemas.clone(),
        });
    }
    let registry = SchemaRegistry::from_path_in(config.engine(), &args.schemas).map_err(|source| {
        Error::Declaration {
            path: args.schemas.clone(),
            source,
        }
    })?;
    debug!(schemas = registry.len(), path = %args.schemas.display(), "Loaded declarations");
    Ok(registry)
}

/// Pick the schema named by `--schema`, or the only declared one
pub fn select_schema(registry: &SchemaRegistry, name: Option<&str>) -> Result<Schema> {
    match name {
        Some(name) => registry.get(name).cloned().ok_or_else(|| Error::SchemaNotFound {
            name: name.to_string(),
            available: registry.names().map(str::to_string).collect(),
        }),
        None if registry.len() == 1 => registry
            .iter()
            .next()
            .map(|(_, schema)| schema.clone())
            .ok_or_else(|| Error::other("declaration document is empty")),
        None => Err(Error::invalid_args(format!(
            "--schema is required when the document declares {} schemas ({})",
            registry.len(),
            registry.names().collect::<Vec<_>>().join(", ")
        ))),
    }
}

/// Read an input record from a file or from stdin (`-`)
pub fn read_input(path: &Path) -> Result<Value> {
    if path == Path::new("-") {
        let mut content = String::new();
        std::io::stdin().read_to_string(&mut content)?;
        return parse_input(path, &content, false);
    }

    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(path)?;
    let is_yaml = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s == "yaml" || s == "yml")
        .unwrap_or(false);
    parse_input(path, &content, is_yaml)
}

/// Parse input text as JSON, falling back to YAML
pub fn parse_input(path: &Path, content: &str, is_yaml: bool) -> Result<Value> {
    let invalid = |message: String| Error::InvalidInput {
        path: path.to_path_buf(),
        message,
    };

    if is_yaml {
        return serde_yaml::from_str(content).map_err(|e| invalid(e.to_string()));
    }
    match serde_json::from_str(content) {
        Ok(value) => Ok(value),
        Err(json_err) => serde_yaml::from_str(content)
            .map_err(|_| invalid(format!("not valid JSON or YAML ({})", json_err))),
    }
}
