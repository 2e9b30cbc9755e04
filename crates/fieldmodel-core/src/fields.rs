//! Field extension factories
//!
//! Ready-made descriptors for common wire encodings: JSON carried as a string,
//! delimited lists carried as a string, and booleans carried as `1`/`0`.
//! Each factory installs parse and convert hooks on the passed descriptor
//! unless the descriptor already has its own.

use crate::error::Error;
use crate::field::{Field, FieldContext};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

/// Separator used by [`split_field`] when none is given
pub const DEFAULT_SEPARATOR: &str = ", ";

/// How far [`remove_empty_values`] descends into nested maps
///
/// Declarations accept either a level count or a flag, where `true` is
/// [`Recursion::Unbounded`] and `false` is `Depth(0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RecursionRepr", into = "RecursionRepr")]
pub enum Recursion {
    /// Clean this many nested levels below the top one
    Depth(usize),
    Unbounded,
}

impl Default for Recursion {
    fn default() -> Self {
        Recursion::Depth(0)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RecursionRepr {
    Flag(bool),
    Depth(usize),
}

impl From<RecursionRepr> for Recursion {
    fn from(repr: RecursionRepr) -> Self {
        match repr {
            RecursionRepr::Flag(true) => Recursion::Unbounded,
            RecursionRepr::Flag(false) => Recursion::Depth(0),
            RecursionRepr::Depth(depth) => Recursion::Depth(depth),
        }
    }
}

impl From<Recursion> for RecursionRepr {
    fn from(recursion: Recursion) -> Self {
        match recursion {
            Recursion::Unbounded => RecursionRepr::Flag(true),
            Recursion::Depth(depth) => RecursionRepr::Depth(depth),
        }
    }
}

/// Options of [`json_field`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonFieldOptions {
    /// Strip `null` and `""` entries before serializing
    pub remove_empty: bool,
    /// Nested levels `remove_empty` also cleans; top level only by default
    pub recursion: Recursion,
}

impl JsonFieldOptions {
    pub fn remove_empty(mut self, enabled: bool) -> Self {
        self.remove_empty = enabled;
        self
    }

    pub fn recursion(mut self, recursion: Recursion) -> Self {
        self.recursion = recursion;
        self
    }
}

/// Structured value stored on the wire as a JSON string
///
/// ```
/// use fieldmodel_core::fields::{json_field, JsonFieldOptions};
/// use fieldmodel_core::{fields, Schema, SchemaOptions};
/// use serde_json::json;
///
/// let schema = Schema::define(
///     fields! { "config" => json_field("user_config", JsonFieldOptions::default()) },
///     SchemaOptions::default(),
/// );
/// let instance = schema.parse(json!({"user_config": "{\"theme\":\"dark\"}"})).unwrap();
/// assert_eq!(instance.to_json(), json!({"config": {"theme": "dark"}}));
/// ```
pub fn json_field(field: impl Into<Field>, options: JsonFieldOptions) -> Field {
    let mut field = field.into();
    if field.parse.is_none() {
        field = field.parse_with(|ctx, value| {
            let Some(value) = value.filter(|value| value.is_truthy()) else {
                return Ok(default_of(ctx));
            };
            match value {
                Value::String(text) => serde_json::from_str::<JsonValue>(text)
                    .map(|parsed| Some(Value::from(parsed)))
                    .map_err(|err| Error::hook_source(ctx.field, anyhow::Error::from(err))),
                other => Ok(Some(Value::from(other.to_json()))),
            }
        });
    }
    if field.convert.is_none() {
        field = field.convert_with(move |_, value| {
            let Some(value) = value.filter(|value| value.is_truthy()) else {
                return Ok(Some(JsonValue::String(String::new())));
            };
            if let Value::String(text) = value {
                return Ok(Some(JsonValue::String(text.clone())));
            }
            let mut json = value.to_json();
            if options.remove_empty {
                if let JsonValue::Object(map) = &mut json {
                    remove_empty_values(map, options.recursion);
                }
            }
            Ok(Some(JsonValue::String(serde_json::to_string(&json)?)))
        });
    }
    field
}

/// List stored on the wire as a delimited string
pub fn split_field(field: impl Into<Field>, separator: impl Into<String>) -> Field {
    let separator = separator.into();
    let mut field = field.into();
    if field.parse.is_none() {
        let delimiter = separator.trim().to_string();
        field = field.parse_with(move |_, value| {
            let Some(value) = value.filter(|value| value.is_truthy()) else {
                return Ok(Some(Value::Array(Vec::new())));
            };
            if let Value::Array(_) = value {
                return Ok(Some(value.clone()));
            }
            let text = value.to_text();
            let pieces: Vec<Value> = if delimiter.is_empty() {
                vec![Value::from(text.trim())]
            } else {
                text.split(delimiter.as_str()).map(|piece| Value::from(piece.trim())).collect()
            };
            Ok(Some(Value::Array(pieces)))
        });
    }
    if field.convert.is_none() {
        field = field.convert_with(move |_, value| {
            let text = match value {
                None | Some(Value::Null) => String::new(),
                Some(Value::Array(items)) => items
                    .iter()
                    .map(Value::to_text)
                    .collect::<Vec<_>>()
                    .join(&separator),
                Some(other) => other.to_text(),
            };
            Ok(Some(JsonValue::String(text)))
        });
    }
    field
}

/// Boolean stored on the wire as `1`/`0`
pub fn bool_int_field(field: impl Into<Field>) -> Field {
    let mut field = field.into();
    if field.parse.is_none() {
        field = field.parse_with(|ctx, value| {
            let truthy = match value {
                Some(value) => value.is_truthy(),
                None => default_of(ctx).is_some_and(|value| value.is_truthy()),
            };
            Ok(Some(Value::Bool(truthy)))
        });
    }
    if field.convert.is_none() {
        field = field.convert_with(|_, value| {
            let flag = value.is_some_and(Value::is_truthy);
            Ok(Some(JsonValue::from(u8::from(flag))))
        });
    }
    field
}

/// Drop `null` and `""` entries, descending into nested maps as far as
/// `recursion` allows. Nested maps left empty are dropped too.
pub fn remove_empty_values(map: &mut JsonMap<String, JsonValue>, recursion: Recursion) {
    let nested = match recursion {
        Recursion::Depth(0) => None,
        Recursion::Depth(depth) => Some(Recursion::Depth(depth - 1)),
        Recursion::Unbounded => Some(Recursion::Unbounded),
    };
    map.retain(|_, value| match value {
        JsonValue::Null => false,
        JsonValue::String(text) => !text.is_empty(),
        JsonValue::Object(inner) => match nested {
            None => true,
            Some(nested) => {
                remove_empty_values(inner, nested);
                !inner.is_empty()
            }
        },
        _ => true,
    });
}

fn default_of(ctx: &FieldContext<'_>) -> Option<Value> {
    ctx.descriptor.resolve_default(ctx)
}
