//! Parse and convert command handlers

use super::utils::{load_registry, read_input, select_schema};
use crate::cli::{ConvertArgs, ParseArgs};
use crate::config::Config;
use crate::error::Result;
use crate::logging::{command_span, Timer};
use crate::output::OutputWriter;
use fieldmodel_core::{HandleOptions, Schema};
use serde_json::Value;
use tracing::{debug, info};

/// Handle the parse command
pub fn handle_parse(args: ParseArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let timer = Timer::new(command_span("parse", args.target.schema.as_deref()));
    let _entered = timer.span().enter();

    let registry = load_registry(&args.target, config)?;
    let schema = select_schema(&registry, args.target.schema.as_deref())?;
    let input = read_input(&args.input)?;

    let mut options = HandleOptions::new();
    if let Some(handler) = args.handler {
        options = options.handler(handler.into());
    }
    if args.debug {
        options = options.debug(true);
    }
    if args.strict {
        options = options.strict(true);
    }
    debug!(?options, "Parsing input");

    let parsed = map_records(input, |record| {
        let instance = schema.parse_with(record, options)?;
        Ok(instance.to_json())
    })?;
    info!(schema = %schema.name(), "Parsed input");
    output.data(&parsed)
}

/// Handle the convert command
pub fn handle_convert(args: ConvertArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let timer = Timer::new(command_span("convert", args.target.schema.as_deref()));
    let _entered = timer.span().enter();

    let registry = load_registry(&args.target, config)?;
    let schema = select_schema(&registry, args.target.schema.as_deref())?;
    let input = read_input(&args.input)?;

    let converted = map_records(input, |record| convert_record(&schema, record, args.strict))?;
    info!(schema = %schema.name(), "Converted input");
    output.data(&converted)
}

/// Parse a raw record and convert it back to source shape
pub fn convert_record(schema: &Schema, record: Value, strict: bool) -> Result<Value> {
    let options = if strict {
        HandleOptions::new().strict(true)
    } else {
        HandleOptions::new()
    };
    let instance = schema.parse_with(record, options)?;
    Ok(Value::Object(schema.convert(&instance)?))
}

/// Apply `f` to a single record, or to each element of an array input
fn map_records<F>(input: Value, mut f: F) -> Result<Value>
where
    F: FnMut(Value) -> Result<Value>,
{
    match input {
        Value::Array(items) => items.into_iter().map(&mut f).collect::<Result<Vec<_>>>().map(Value::Array),
        record => f(record),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldmodel_core::SchemaRegistry;
    use serde_json::json;

    fn user() -> Schema {
        let registry = SchemaRegistry::from_yaml_str(
            "schemas:\n  User:\n    fields:\n      id: user_id\n      age: { key: user_age, model: Number }\n",
        )
        .expect("registry");
        registry.get("User").cloned().expect("User")
    }

    #[test]
    fn test_convert_record() {
        let converted = convert_record(&user(), json!({"user_id": 3, "user_age": "41"}), false).expect("convert");
        assert_eq!(converted, json!({"user_id": 3, "user_age": 41}));
    }

    #[test]
    fn test_strict_convert_rejects_mismatch() {
        let err = convert_record(&user(), json!({"user_age": "old"}), true).expect_err("strict");
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_map_records_handles_lists() {
        let schema = user();
        let converted = map_records(json!([{"user_id": 1}, {"user_id": 2}]), |record| {
            convert_record(&schema, record, false)
        })
        .expect("list");
        assert_eq!(
            converted,
            json!([{"user_id": 1, "user_age": 0}, {"user_id": 2, "user_age": 0}])
        );
    }
}
