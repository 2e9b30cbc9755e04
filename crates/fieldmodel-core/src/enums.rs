//! Enum resolver adapter
//!
//! A field may carry an [`EnumSpec`]. The engine does not implement enum
//! semantics itself: it hands the spec to the [`EnumFactory`] registered on the
//! engine configuration and caches the resulting [`EnumLookup`] per field per
//! schema. [`LabelEnumFactory`] is a bundled factory for callers that do not
//! bring their own.
//!
//! # Examples
//!
//! ```
//! use fieldmodel_core::enums::{EnumEntry, EnumFactory, EnumSpec, LabelEnumFactory};
//! use serde_json::json;
//!
//! let spec = EnumSpec::List(vec![EnumEntry::new("A", json!(1)).label("Alpha")]);
//! let lookup = LabelEnumFactory.build(&spec).unwrap();
//! assert_eq!(lookup.label(&json!(1)).as_deref(), Some("Alpha"));
//! assert_eq!(lookup.label(&json!("A")).as_deref(), Some("Alpha"));
//! ```

use crate::error::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

/// Enum declaration attached to a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumSpec {
    /// `[{ key, value, label }]`
    List(Vec<EnumEntry>),
    /// `{ key: value }` or `{ key: { value, label } }`
    Map(IndexMap<String, EnumItem>),
}

/// One entry of a list-style enum spec
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumEntry {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl EnumEntry {
    pub fn new(key: impl Into<String>, value: JsonValue) -> Self {
        Self {
            key: key.into(),
            value: Some(value),
            label: None,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Value side of a map-style enum spec
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumItem {
    Detailed(EnumDetail),
    Scalar(JsonValue),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnumDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Label lookup built from an enum spec
pub trait EnumLookup: fmt::Debug + Send + Sync {
    /// Value declared under `key`
    fn get(&self, key: &str) -> Option<&JsonValue>;

    fn keys(&self) -> Vec<&str>;

    /// Display label for either a key or a value
    fn label(&self, key_or_value: &JsonValue) -> Option<String>;
}

/// Collaborator turning enum specs into lookups
pub trait EnumFactory: Send + Sync {
    fn build(&self, spec: &EnumSpec) -> Result<Arc<dyn EnumLookup>>;
}

/// One resolved enum member
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelEnumItem {
    pub key: String,
    pub value: JsonValue,
    pub label: String,
}

/// Plain label lookup: values default to keys, labels default to keys
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LabelEnum {
    items: Vec<LabelEnumItem>,
}

impl LabelEnum {
    pub fn from_spec(spec: &EnumSpec) -> Self {
        let items = match spec {
            EnumSpec::List(entries) => entries
                .iter()
                .map(|entry| LabelEnumItem {
                    key: entry.key.clone(),
                    value: entry
                        .value
                        .clone()
                        .unwrap_or_else(|| JsonValue::String(entry.key.clone())),
                    label: entry.label.clone().unwrap_or_else(|| entry.key.clone()),
                })
                .collect(),
            EnumSpec::Map(map) => map
                .iter()
                .map(|(key, item)| {
                    let (value, label) = match item {
                        EnumItem::Scalar(value) => (Some(value.clone()), None),
                        EnumItem::Detailed(detail) => (detail.value.clone(), detail.label.clone()),
                    };
                    LabelEnumItem {
                        key: key.clone(),
                        value: value.unwrap_or_else(|| JsonValue::String(key.clone())),
                        label: label.unwrap_or_else(|| key.clone()),
                    }
                })
                .collect(),
        };
        Self { items }
    }

    pub fn items(&self) -> &[LabelEnumItem] {
        &self.items
    }
}

impl EnumLookup for LabelEnum {
    fn get(&self, key: &str) -> Option<&JsonValue> {
        self.items
            .iter()
            .find(|item| item.key == key)
            .map(|item| &item.value)
    }

    fn keys(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.key.as_str()).collect()
    }

    fn label(&self, key_or_value: &JsonValue) -> Option<String> {
        self.items
            .iter()
            .find(|item| &item.value == key_or_value)
            .or_else(|| {
                let key = key_or_value.as_str()?;
                self.items.iter().find(|item| item.key == key)
            })
            .map(|item| item.label.clone())
    }
}

/// Factory producing [`LabelEnum`] lookups
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelEnumFactory;

impl EnumFactory for LabelEnumFactory {
    fn build(&self, spec: &EnumSpec) -> Result<Arc<dyn EnumLookup>> {
        Ok(Arc::new(LabelEnum::from_spec(spec)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_map_spec_labels_default_to_keys() {
        let spec: EnumSpec = serde_json::from_value(json!({
            "a": "a1",
            "b": 1,
            "c": {"value": true},
            "d": {"value": false}
        }))
        .unwrap();
        let lookup = LabelEnum::from_spec(&spec);

        assert_eq!(lookup.label(&json!("a")).as_deref(), Some("a"));
        assert_eq!(lookup.label(&json!("a1")).as_deref(), Some("a"));
        assert_eq!(lookup.label(&json!(1)).as_deref(), Some("b"));
        assert_eq!(lookup.label(&json!(false)).as_deref(), Some("d"));
        assert_eq!(lookup.get("c"), Some(&json!(true)));
        assert_eq!(lookup.keys(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_detailed_map_spec() {
        let spec: EnumSpec = serde_json::from_value(json!({
            "male": {"value": 1, "label": "Male"},
            "female": {"value": 2, "label": "Female"}
        }))
        .unwrap();
        let lookup = LabelEnum::from_spec(&spec);
        assert_eq!(lookup.label(&json!(2)).as_deref(), Some("Female"));
        assert_eq!(lookup.label(&json!("male")).as_deref(), Some("Male"));
        assert_eq!(lookup.label(&json!(3)), None);
    }

    #[test]
    fn test_list_spec_from_json() {
        let spec: EnumSpec = serde_json::from_value(json!([
            {"key": "A", "value": 1, "label": "Alpha"},
            {"key": "B"}
        ]))
        .unwrap();
        let lookup = LabelEnumFactory.build(&spec).unwrap();
        assert_eq!(lookup.label(&json!("A")).as_deref(), Some("Alpha"));
        assert_eq!(lookup.get("B"), Some(&json!("B")));
        assert_eq!(lookup.label(&json!("B")).as_deref(), Some("B"));
    }
}
