//! Property-based tests for coercion and schema round trips
//!
//! These tests verify invariants that should hold for any raw input handed
//! to the engine.


use fieldmodel_core::{coerce, fields, Field, Primitive, Schema, SchemaOptions, Value};
use proptest::prelude::*;
use serde_json::{json, Value as JsonValue};

// Strategy functions for property testing

/// Strategy for generating primitive kinds
fn primitive_strategy() -> impl Strategy<Value = Primitive> {
    prop_oneof![
        Just(Primitive::Text),
        Just(Primitive::Number),
        Just(Primitive::Boolean),
        Just(Primitive::Timestamp),
        Just(Primitive::Sequence),
        Just(Primitive::Map),
    ]
}

/// Strategy for generating arbitrary raw JSON values
fn raw_value_strategy() -> impl Strategy<Value = JsonValue> {
    let leaf = prop_oneof![
        Just(JsonValue::Null),
        any::<bool>().prop_map(JsonValue::Bool),
        any::<i32>().prop_map(|n| json!(n)),
        (-1.0e9f64..1.0e9).prop_map(|n| json!(n)),
        "[a-zA-Z0-9 .,:+-]{0,24}".prop_map(JsonValue::String),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(JsonValue::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|map| JsonValue::Object(map.into_iter().collect())),
        ]
    })
}

fn round_trip_schema() -> Schema {
    Schema::define_in(
        test_support::config(),
        fields! {
            "id" => "user_id",
            "name" => Field::keyed("user_name").model(Primitive::Text),
            "score" => Field::keyed("user_score").model(Primitive::Number),
            "active" => Field::keyed("is_active").model(Primitive::Boolean),
        },
        SchemaOptions::default(),
    )
}

proptest! {
    #[test]
    fn prop_coerce_is_total(kind in primitive_strategy(), raw in raw_value_strategy()) {
        let value = Value::from(raw);
        let coerced = coerce(kind, Some(&value));
        let matches_kind = match kind {
            Primitive::Text => matches!(coerced, Value::String(_)),
            Primitive::Number => matches!(coerced, Value::Number(n) if !n.is_nan()),
            Primitive::Boolean => matches!(coerced, Value::Bool(_)),
            Primitive::Timestamp => matches!(coerced, Value::Timestamp(_)),
            Primitive::Sequence => matches!(coerced, Value::Array(_)),
            Primitive::Map => matches!(coerced, Value::Object(_)),
        };
        prop_assert!(matches_kind);
    }

    #[test]
    fn prop_coerce_absent_is_empty(kind in primitive_strategy()) {
        let coerced = coerce(kind, None);
        let expected = match kind {
            Primitive::Text => Value::from(""),
            Primitive::Number => Value::from(0),
            Primitive::Boolean => Value::from(false),
            Primitive::Timestamp => return Ok(()),
            Primitive::Sequence => Value::Array(Vec::new()),
            Primitive::Map => Value::object(),
        };
        prop_assert_eq!(coerced, expected);
    }

    #[test]
    fn prop_whitespace_numbers_are_zero(spaces in "[ \t]{0,8}") {
        prop_assert_eq!(coerce(Primitive::Number, Some(&Value::from(spaces))), Value::from(0));
    }

    #[test]
    fn prop_round_trip_keeps_source_keys(
        id in any::<u32>(),
        name in "[a-zA-Z ]{0,16}",
        score in -100000i32..100000,
        active in any::<bool>(),
    ) {
        let schema = round_trip_schema();
        let raw = json!({
            "user_id": id,
            "user_name": name.clone(),
            "user_score": score.to_string(),
            "is_active": active,
        });
        let instance = schema.parse(raw).expect("parse never fails without strict");
        let converted = JsonValue::Object(schema.convert(&instance).expect("convert"));

        prop_assert_eq!(&converted["user_id"], &json!(id));
        prop_assert_eq!(&converted["user_name"], &json!(name));
        prop_assert_eq!(&converted["user_score"], &json!(score));
        prop_assert_eq!(&converted["is_active"], &json!(active));
    }
}
