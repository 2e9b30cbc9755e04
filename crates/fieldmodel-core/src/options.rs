//! Schema options and per-call handling options
//!
//! Every option is an `Option<_>` so that composition can layer new options
//! over a base schema's options field by field, and so that per-call
//! overrides fall through to per-schema values only where they are unset.

use crate::instance::Instance;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Pre-ingestion hook: may replace the payload handed to `update`
pub type BeforeUpdateFn = Rc<dyn Fn(&Instance, Value) -> Value>;

/// Post-ingestion hook; `data` is `None` after `clear`
pub type DataChangeFn = Rc<dyn Fn(&Instance, Option<&Value>)>;

/// Ingestion strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handler {
    /// Read fields by source key
    #[default]
    Update,
    /// Read fields by logical name
    Merge,
    /// Copy every key of the payload, declared or not
    Attr,
}

impl fmt::Display for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Update => write!(f, "update"),
            Handler::Merge => write!(f, "merge"),
            Handler::Attr => write!(f, "attr"),
        }
    }
}

impl std::str::FromStr for Handler {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "update" => Ok(Handler::Update),
            "merge" => Ok(Handler::Merge),
            "attr" => Ok(Handler::Attr),
            other => Err(format!("unknown handler '{}'", other)),
        }
    }
}

/// Options recognized by a schema
#[derive(Clone, Default)]
pub struct SchemaOptions {
    /// Name used in type names and diagnostics
    pub name: Option<String>,
    /// Coerce values on parse (default true)
    pub parse_to_model: Option<bool>,
    /// Re-coerce values on convert (default false)
    pub convert_to_model: Option<bool>,
    pub handler: Option<Handler>,
    pub debug: Option<bool>,
    pub strict: Option<bool>,
    pub on_before_update: Option<BeforeUpdateFn>,
    pub on_data_change: Option<DataChangeFn>,
}

impl SchemaOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn parse_to_model(mut self, enabled: bool) -> Self {
        self.parse_to_model = Some(enabled);
        self
    }

    /// Alias of [`SchemaOptions::parse_to_model`]
    pub fn auto_parse(self, enabled: bool) -> Self {
        self.parse_to_model(enabled)
    }

    pub fn convert_to_model(mut self, enabled: bool) -> Self {
        self.convert_to_model = Some(enabled);
        self
    }

    /// Alias of [`SchemaOptions::convert_to_model`]
    pub fn auto_convert(self, enabled: bool) -> Self {
        self.convert_to_model(enabled)
    }

    pub fn handler(mut self, handler: Handler) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = Some(enabled);
        self
    }

    pub fn strict(mut self, enabled: bool) -> Self {
        self.strict = Some(enabled);
        self
    }

    pub fn on_before_update<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Instance, Value) -> Value + 'static,
    {
        self.on_before_update = Some(Rc::new(hook));
        self
    }

    pub fn on_data_change<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Instance, Option<&Value>) + 'static,
    {
        self.on_data_change = Some(Rc::new(hook));
        self
    }

    /// `{ ...self, ...overrides }`
    pub fn merged_with(&self, overrides: &SchemaOptions) -> SchemaOptions {
        SchemaOptions {
            name: overrides.name.clone().or_else(|| self.name.clone()),
            parse_to_model: overrides.parse_to_model.or(self.parse_to_model),
            convert_to_model: overrides.convert_to_model.or(self.convert_to_model),
            handler: overrides.handler.or(self.handler),
            debug: overrides.debug.or(self.debug),
            strict: overrides.strict.or(self.strict),
            on_before_update: overrides
                .on_before_update
                .clone()
                .or_else(|| self.on_before_update.clone()),
            on_data_change: overrides
                .on_data_change
                .clone()
                .or_else(|| self.on_data_change.clone()),
        }
    }
}

impl fmt::Debug for SchemaOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaOptions")
            .field("name", &self.name)
            .field("parse_to_model", &self.parse_to_model)
            .field("convert_to_model", &self.convert_to_model)
            .field("handler", &self.handler)
            .field("debug", &self.debug)
            .field("strict", &self.strict)
            .field("on_before_update", &self.on_before_update.is_some())
            .field("on_data_change", &self.on_data_change.is_some())
            .finish()
    }
}

/// Per-call overrides for ingestion
///
/// Values set here flow unchanged into nested schema calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandleOptions {
    pub skip_null: Option<bool>,
    pub handler: Option<Handler>,
    pub parse_to_model: Option<bool>,
    pub debug: Option<bool>,
    pub strict: Option<bool>,
}

impl HandleOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip_null(mut self, enabled: bool) -> Self {
        self.skip_null = Some(enabled);
        self
    }

    pub fn handler(mut self, handler: Handler) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn parse_to_model(mut self, enabled: bool) -> Self {
        self.parse_to_model = Some(enabled);
        self
    }

    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = Some(enabled);
        self
    }

    pub fn strict(mut self, enabled: bool) -> Self {
        self.strict = Some(enabled);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merged_with_overrides_set_values_only() {
        let base = SchemaOptions::new()
            .name("User")
            .handler(Handler::Merge)
            .debug(true)
            .on_data_change(|_, _| {});
        let derived = base.merged_with(&SchemaOptions::new().auto_parse(false).debug(false));

        assert_eq!(derived.name.as_deref(), Some("User"));
        assert_eq!(derived.handler, Some(Handler::Merge));
        assert_eq!(derived.parse_to_model, Some(false));
        assert_eq!(derived.debug, Some(false));
        assert!(derived.on_data_change.is_some());
        assert_eq!(base.debug, Some(true));
    }

    #[test]
    fn test_handler_parse_and_display() {
        for handler in [Handler::Update, Handler::Merge, Handler::Attr] {
            assert_eq!(handler.to_string().parse::<Handler>(), Ok(handler));
        }
        assert!("replace".parse::<Handler>().is_err());
        assert_eq!(Handler::default(), Handler::Update);
    }

    #[test]
    fn test_handler_serde_lowercase() {
        let handler: Handler = serde_json::from_str("\"attr\"").unwrap();
        assert_eq!(handler, Handler::Attr);
        assert_eq!(serde_json::to_string(&Handler::Merge).unwrap(), "\"merge\"");
    }
}
