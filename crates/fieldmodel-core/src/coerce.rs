//! Type coercion table
//!
//! Pure functions converting an arbitrary raw value into one of the six
//! primitive target kinds, plus the diagnostic type check and the emptiness
//! predicate used to drop optional fields on output.
//!
//! `coerce` is total: every input maps to a value of the requested kind.
//!
//! # Examples
//!
//! ```
//! use fieldmodel_core::coerce::{coerce, Primitive};
//! use fieldmodel_core::Value;
//!
//! assert_eq!(coerce(Primitive::Number, Some(&Value::from("12.5px"))), Value::from(12.5));
//! assert_eq!(coerce(Primitive::Number, Some(&Value::from("abc"))), Value::from(0));
//! assert_eq!(coerce(Primitive::Text, None), Value::from(""));
//! assert_eq!(coerce(Primitive::Boolean, Some(&Value::from("1"))), Value::from(true));
//! ```

use crate::field::Model;
use crate::value::{Timestamp, Value};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// The closed set of primitive target kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Text,
    Number,
    Boolean,
    Timestamp,
    /// Ordered sequence of untyped elements
    Sequence,
    /// Unordered string-keyed map
    Map,
}

impl Primitive {
    pub const ALL: [Primitive; 6] = [
        Primitive::Text,
        Primitive::Number,
        Primitive::Boolean,
        Primitive::Timestamp,
        Primitive::Sequence,
        Primitive::Map,
    ];

    /// Constructor-style name used in type names and diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Primitive::Text => "String",
            Primitive::Number => "Number",
            Primitive::Boolean => "Boolean",
            Primitive::Timestamp => "Date",
            Primitive::Sequence => "Array",
            Primitive::Map => "Object",
        }
    }

    /// Resolve a constructor-style or lowercase kind name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "String" | "string" | "text" => Some(Primitive::Text),
            "Number" | "number" => Some(Primitive::Number),
            "Boolean" | "boolean" | "bool" => Some(Primitive::Boolean),
            "Date" | "date" | "timestamp" => Some(Primitive::Timestamp),
            "Array" | "array" | "sequence" => Some(Primitive::Sequence),
            "Object" | "object" | "map" => Some(Primitive::Map),
            _ => None,
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn float_prefix() -> &'static Regex {
    static FLOAT_PREFIX: OnceLock<Regex> = OnceLock::new();
    FLOAT_PREFIX.get_or_init(|| {
        Regex::new(r"^[+-]?(?:Infinity|(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)")
            .expect("valid float prefix pattern")
    })
}

fn decimal_literal() -> &'static Regex {
    static DECIMAL_LITERAL: OnceLock<Regex> = OnceLock::new();
    DECIMAL_LITERAL.get_or_init(|| {
        Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$")
            .expect("valid decimal literal pattern")
    })
}

fn digits_only() -> &'static Regex {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    DIGITS.get_or_init(|| Regex::new(r"^\d+$").expect("valid digits pattern"))
}

/// Leading-float parse: `"12.5px"` → `12.5`, `"abc"` → `None`
pub fn parse_float(text: &str) -> Option<f64> {
    let found = float_prefix().find(text.trim_start())?.as_str();
    if found.trim_start_matches(['+', '-']) == "Infinity" {
        return Some(if found.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }
    found.parse().ok()
}

/// Whole-string numeric parse: blank text is `0`, trailing garbage is `None`
pub fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return Some(0.0);
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(body) = text.strip_prefix(prefix) {
            return u64::from_str_radix(body, radix).ok().map(|n| n as f64);
        }
    }
    match text {
        "Infinity" | "+Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        _ if decimal_literal().is_match(text) => text.parse().ok(),
        _ => None,
    }
}

/// Coerce a raw value into the given primitive kind. Never fails.
pub fn coerce(kind: Primitive, value: Option<&Value>) -> Value {
    match kind {
        Primitive::Text => Value::String(match value {
            None | Some(Value::Null) => String::new(),
            Some(value) => value.to_text(),
        }),
        Primitive::Number => Value::Number(to_float(value)),
        Primitive::Boolean => {
            let text = value.map(Value::to_text).unwrap_or_else(|| "undefined".to_string());
            Value::Bool(text == "true" || text == "1")
        }
        Primitive::Timestamp => Value::Timestamp(to_timestamp(value)),
        Primitive::Sequence => match value {
            Some(Value::Array(items)) => Value::Array(items.clone()),
            _ => Value::Array(Vec::new()),
        },
        Primitive::Map => match value {
            Some(Value::Object(record)) => Value::Object(record.clone()),
            Some(Value::Instance(instance)) => Value::Object(instance.snapshot()),
            _ => Value::object(),
        },
    }
}

fn to_float(value: Option<&Value>) -> f64 {
    let n = match value {
        Some(Value::Number(n)) => *n,
        Some(Value::String(s)) => parse_float(s).unwrap_or(f64::NAN),
        Some(array @ Value::Array(_)) => parse_float(&array.to_text()).unwrap_or(f64::NAN),
        _ => f64::NAN,
    };
    if n.is_nan() {
        0.0
    } else {
        n
    }
}

fn to_timestamp(value: Option<&Value>) -> Timestamp {
    match value {
        Some(Value::Timestamp(ts)) => *ts,
        Some(Value::Number(n)) => Timestamp::from_millis_f64(*n),
        Some(Value::String(s)) if digits_only().is_match(s) => s
            .parse::<i64>()
            .map(Timestamp::from_millis)
            .unwrap_or_else(|_| Timestamp::invalid()),
        Some(value) if !value.is_truthy() => Timestamp::invalid(),
        Some(Value::String(s)) => Timestamp::parse(s),
        Some(Value::Bool(_)) => Timestamp::from_millis(1),
        Some(value @ Value::Array(_)) => Timestamp::parse(&value.to_text()),
        _ => Timestamp::invalid(),
    }
}

/// Best-effort diagnostic compatibility check. Absent and null values always pass.
pub fn check_type(model: &Model, value: Option<&Value>) -> bool {
    let value = match value {
        None | Some(Value::Null) => return true,
        Some(value) => value,
    };
    match model {
        Model::SequenceOf(_) => matches!(value, Value::Array(_)),
        Model::Nested(_) => value.is_structured(),
        Model::Primitive(kind) => check_primitive(*kind, value),
    }
}

fn check_primitive(kind: Primitive, value: &Value) -> bool {
    match kind {
        Primitive::Text | Primitive::Boolean => !value.is_structured(),
        Primitive::Number => match value {
            Value::Number(n) => !n.is_nan(),
            Value::String(s) => parse_number(s).is_some(),
            Value::Bool(_) => true,
            _ => false,
        },
        Primitive::Timestamp => match value {
            Value::Timestamp(_) => true,
            Value::Number(n) => Timestamp::from_millis_f64(*n).is_valid(),
            Value::String(s) => Timestamp::parse(s).is_valid(),
            Value::Bool(_) => true,
            _ => false,
        },
        Primitive::Sequence => matches!(value, Value::Array(_)),
        Primitive::Map => matches!(value, Value::Object(_) | Value::Instance(_)),
    }
}

/// Whether a value is semantically empty for its kind
///
/// Empty text, an empty array for sequences, an empty map for maps; absent
/// and null values are always empty.
pub fn is_empty_value(value: Option<&Value>, kind: Option<Primitive>, is_sequence: bool) -> bool {
    let value = match value {
        None | Some(Value::Null) => return true,
        Some(value) => value,
    };
    if is_sequence || kind == Some(Primitive::Sequence) {
        return matches!(value, Value::Array(items) if items.is_empty());
    }
    match kind {
        Some(Primitive::Map) => match value {
            Value::Object(record) => record.is_empty(),
            Value::Instance(instance) => instance.keys().is_empty(),
            _ => false,
        },
        Some(Primitive::Text) => matches!(value, Value::String(s) if s.is_empty()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Element;
    use serde_json::json;

    fn coerced(kind: Primitive, raw: serde_json::Value) -> Value {
        coerce(kind, Some(&Value::from(raw)))
    }

    #[test]
    fn test_text_coercion() {
        assert_eq!(coerce(Primitive::Text, None), Value::from(""));
        assert_eq!(coerce(Primitive::Text, Some(&Value::Null)), Value::from(""));
        assert_eq!(coerced(Primitive::Text, json!(10)), Value::from("10"));
        assert_eq!(coerced(Primitive::Text, json!(false)), Value::from("false"));
        assert_eq!(coerced(Primitive::Text, json!([1, 2])), Value::from("1,2"));
    }

    #[test]
    fn test_number_coercion() {
        assert_eq!(coerced(Primitive::Number, json!("20")), Value::from(20));
        assert_eq!(coerced(Primitive::Number, json!("  3.5e1kg")), Value::from(35));
        assert_eq!(coerced(Primitive::Number, json!("abc")), Value::from(0));
        assert_eq!(coerced(Primitive::Number, json!("   ")), Value::from(0));
        assert_eq!(coerced(Primitive::Number, json!(true)), Value::from(0));
        assert_eq!(coerced(Primitive::Number, json!({})), Value::from(0));
        assert_eq!(coerce(Primitive::Number, None), Value::from(0));
        assert_eq!(
            coerced(Primitive::Number, json!("-Infinity")),
            Value::Number(f64::NEG_INFINITY)
        );
    }

    #[test]
    fn test_boolean_coercion() {
        assert_eq!(coerced(Primitive::Boolean, json!("true")), Value::from(true));
        assert_eq!(coerced(Primitive::Boolean, json!(1)), Value::from(true));
        assert_eq!(coerced(Primitive::Boolean, json!("1")), Value::from(true));
        assert_eq!(coerced(Primitive::Boolean, json!("yes")), Value::from(false));
        assert_eq!(coerced(Primitive::Boolean, json!(2)), Value::from(false));
        assert_eq!(coerce(Primitive::Boolean, None), Value::from(false));
    }

    #[test]
    fn test_timestamp_coercion() {
        let from_digits = coerced(Primitive::Timestamp, json!("86400000"));
        assert_eq!(
            from_digits.as_timestamp().and_then(Timestamp::to_iso_string).as_deref(),
            Some("1970-01-02T00:00:00.000Z")
        );

        let from_zero = coerced(Primitive::Timestamp, json!(0));
        assert_eq!(from_zero.as_timestamp().and_then(Timestamp::millis), Some(0));

        let from_text = coerced(Primitive::Timestamp, json!("2023-05-06T07:08:09Z"));
        assert!(from_text.as_timestamp().is_some_and(Timestamp::is_valid));

        for falsy in [json!(""), json!(null), json!(false)] {
            let ts = coerced(Primitive::Timestamp, falsy);
            assert!(!ts.as_timestamp().is_some_and(Timestamp::is_valid));
        }
        assert!(!coerce(Primitive::Timestamp, None)
            .as_timestamp()
            .is_some_and(Timestamp::is_valid));
    }

    #[test]
    fn test_container_coercion() {
        assert_eq!(coerced(Primitive::Sequence, json!([1])), Value::from(json!([1])));
        assert_eq!(coerced(Primitive::Sequence, json!("a")), Value::Array(vec![]));
        assert_eq!(coerced(Primitive::Map, json!({"a": 1})), Value::from(json!({"a": 1})));
        assert_eq!(coerced(Primitive::Map, json!([1])), Value::object());
    }

    #[test]
    fn test_parse_number_is_strict() {
        assert_eq!(parse_number(""), Some(0.0));
        assert_eq!(parse_number(" 42 "), Some(42.0));
        assert_eq!(parse_number("0x1F"), Some(31.0));
        assert_eq!(parse_number("12abc"), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn test_check_type_number() {
        let model = Model::Primitive(Primitive::Number);
        assert!(check_type(&model, Some(&Value::from("20"))));
        assert!(check_type(&model, Some(&Value::from("  "))));
        assert!(check_type(&model, None));
        assert!(check_type(&model, Some(&Value::Null)));
        assert!(!check_type(&model, Some(&Value::from("abc"))));
        assert!(!check_type(&model, Some(&Value::object())));
    }

    #[test]
    fn test_check_type_other_kinds() {
        let text = Model::Primitive(Primitive::Text);
        assert!(check_type(&text, Some(&Value::from(1))));
        assert!(!check_type(&text, Some(&Value::from(json!({"first": "a"})))));

        let date = Model::Primitive(Primitive::Timestamp);
        assert!(check_type(&date, Some(&Value::from("2024-01-01"))));
        assert!(!check_type(&date, Some(&Value::from("invalid-date"))));

        let tags = Model::SequenceOf(Element::Primitive(Primitive::Text));
        assert!(check_type(&tags, Some(&Value::from(json!(["a"])))));
        assert!(!check_type(&tags, Some(&Value::from("not-an-array"))));

        let map = Model::Primitive(Primitive::Map);
        assert!(!check_type(&map, Some(&Value::from(json!([])))));
    }

    #[test]
    fn test_is_empty_value() {
        assert!(is_empty_value(None, Some(Primitive::Number), false));
        assert!(is_empty_value(Some(&Value::from("")), Some(Primitive::Text), false));
        assert!(!is_empty_value(Some(&Value::from(0)), Some(Primitive::Number), false));
        assert!(is_empty_value(Some(&Value::Array(vec![])), Some(Primitive::Text), true));
        assert!(!is_empty_value(Some(&Value::from(json!(["a"]))), Some(Primitive::Text), true));
        assert!(is_empty_value(Some(&Value::object()), Some(Primitive::Map), false));
        assert!(!is_empty_value(Some(&Value::from("")), None, false));
    }

    #[test]
    fn test_primitive_names() {
        for kind in Primitive::ALL {
            assert_eq!(Primitive::from_name(kind.name()), Some(kind));
        }
        assert_eq!(Primitive::from_name("bool"), Some(Primitive::Boolean));
        assert_eq!(Primitive::from_name("User"), None);
    }
}
