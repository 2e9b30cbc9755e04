//! Dynamic values flowing through the engine
//!
//! Raw input, parsed instances and converted output are all expressed as a
//! [`Value`] tree. Absence is modelled as `Option::None` at the API boundary;
//! `Value::Null` is an explicit null. Instances are shared handles, so a value
//! tree may contain cycles through [`Value::Instance`].

use crate::instance::{Instance, InstanceId};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::{Map as JsonMap, Number as JsonNumber, Value as JsonValue};
use std::fmt;

/// Insertion-ordered record of logical or ad hoc fields
pub type Record = IndexMap<String, Value>;

/// Source-shaped output of `convert`
pub type RawRecord = JsonMap<String, JsonValue>;

/// Largest magnitude a timestamp may have, in milliseconds from the epoch
const MAX_TIMESTAMP_MILLIS: f64 = 8.64e15;

/// Largest integer an f64 represents exactly
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Formats accepted for timestamps without an explicit offset (read as UTC)
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// A UTC instant, or the invalid timestamp produced from unparseable input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(Option<DateTime<Utc>>);

impl Timestamp {
    /// Timestamp from epoch milliseconds
    pub fn from_millis(millis: i64) -> Self {
        Timestamp(Utc.timestamp_millis_opt(millis).single())
    }

    /// Timestamp from a floating point millisecond count; fractions are truncated
    pub fn from_millis_f64(millis: f64) -> Self {
        if !millis.is_finite() || millis.abs() > MAX_TIMESTAMP_MILLIS {
            return Self::invalid();
        }
        Self::from_millis(millis.trunc() as i64)
    }

    /// The invalid timestamp
    pub fn invalid() -> Self {
        Timestamp(None)
    }

    /// Parse RFC 3339, RFC 2822 or a handful of offset-less formats (read as UTC)
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            return Self::invalid();
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Timestamp(Some(dt.with_timezone(&Utc)));
        }
        if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
            return Timestamp(Some(dt.with_timezone(&Utc)));
        }
        for format in NAIVE_DATETIME_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
                return Timestamp(Some(Utc.from_utc_datetime(&naive)));
            }
        }
        for format in NAIVE_DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(text, format) {
                return Timestamp(date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive)));
            }
        }
        Self::invalid()
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_some()
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        self.0
    }

    pub fn millis(&self) -> Option<i64> {
        self.0.map(|dt| dt.timestamp_millis())
    }

    /// RFC 3339 with millisecond precision, `None` for the invalid timestamp
    pub fn to_iso_string(&self) -> Option<String> {
        self.0.map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Timestamp(Some(dt))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_iso_string() {
            Some(iso) => f.write_str(&iso),
            None => f.write_str("Invalid Date"),
        }
    }
}

/// A dynamic value
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Timestamp(Timestamp),
    Array(Vec<Value>),
    Object(Record),
    Instance(Instance),
}

/// `true` for an absent value or an explicit null
pub fn is_nullish(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

impl Value {
    /// An empty object
    pub fn object() -> Self {
        Value::Object(Record::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Truthiness as dynamic languages define it: null, false, 0, NaN and "" are falsy
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Timestamp(_) | Value::Array(_) | Value::Object(_) | Value::Instance(_) => true,
        }
    }

    /// Arrays, objects, instances and timestamps
    pub fn is_structured(&self) -> bool {
        matches!(
            self,
            Value::Timestamp(_) | Value::Array(_) | Value::Object(_) | Value::Instance(_)
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Record> {
        match self {
            Value::Object(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&Timestamp> {
        match self {
            Value::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }

    /// Runtime shape name used in diagnostics (`[object <name>]`)
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Boolean",
            Value::Number(_) => "Number",
            Value::String(_) => "String",
            Value::Timestamp(_) => "Date",
            Value::Array(_) => "Array",
            Value::Object(_) | Value::Instance(_) => "Object",
        }
    }

    /// Text rendering with dynamic-language semantics
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Timestamp(ts) => ts.to_string(),
            Value::Array(items) => items
                .iter()
                .map(|item| if item.is_null() { String::new() } else { item.to_text() })
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) | Value::Instance(_) => "[object Object]".to_string(),
        }
    }

    /// Read a property of an object or instance
    pub fn field(&self, key: &str) -> Option<Value> {
        match self {
            Value::Object(record) => record.get(key).cloned(),
            Value::Instance(instance) => instance.get(key),
            _ => None,
        }
    }

    /// Enumerable keys of an object or instance
    pub fn keys(&self) -> Vec<String> {
        match self {
            Value::Object(record) => record.keys().cloned().collect(),
            Value::Instance(instance) => instance.keys(),
            _ => Vec::new(),
        }
    }

    /// Convert to JSON. Cyclic instance references become `null`.
    pub fn to_json(&self) -> JsonValue {
        self.to_json_guarded(&mut Vec::new())
    }

    pub(crate) fn to_json_guarded(&self, stack: &mut Vec<InstanceId>) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Timestamp(ts) => ts
                .to_iso_string()
                .map(JsonValue::String)
                .unwrap_or(JsonValue::Null),
            Value::Array(items) => {
                JsonValue::Array(items.iter().map(|item| item.to_json_guarded(stack)).collect())
            }
            Value::Object(record) => JsonValue::Object(
                record
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json_guarded(stack)))
                    .collect(),
            ),
            Value::Instance(instance) => instance.to_json_guarded(stack),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Instance(a), Value::Instance(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Number rendering: integral values print without a fraction
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

pub(crate) fn number_to_json(n: f64) -> JsonValue {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER {
        JsonValue::Number(JsonNumber::from(n as i64))
    } else {
        JsonNumber::from_f64(n)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null)
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => Value::Number(n.as_f64().unwrap_or_default()),
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            JsonValue::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record)
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Value::Instance(instance)
    }
}

impl From<Timestamp> for Value {
    fn from(ts: Timestamp) -> Self {
        Value::Timestamp(ts)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::Timestamp(Timestamp::from(dt))
    }
}
