//! Roundtrip command handler

use super::parse::convert_record;
use super::utils::{load_registry, read_input, select_schema};
use crate::cli::ConvertArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::{command_span, Timer};
use crate::output::{KeyChange, OutputWriter, RoundTripReport};
use fieldmodel_core::Schema;
use serde_json::Value;
use tracing::{info, warn};

/// Handle the roundtrip command
pub fn handle_roundtrip(args: ConvertArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let timer = Timer::new(command_span("roundtrip", args.target.schema.as_deref()));
    let _entered = timer.span().enter();

    let registry = load_registry(&args.target, config)?;
    let schema = select_schema(&registry, args.target.schema.as_deref())?;
    let input = read_input(&args.input)?;
    if !input.is_object() {
        return Err(Error::InvalidInput {
            path: args.input.clone(),
            message: "roundtrip expects a single record object".to_string(),
        });
    }

    let report = round_trip(&schema, input, args.strict)?;
    if report.is_lossless() {
        info!(schema = %report.schema, "Round trip is lossless");
    } else {
        warn!(
            schema = %report.schema,
            lost = report.lost.len(),
            changed = report.changed.len(),
            "Round trip is lossy"
        );
    }
    output.round_trip(&report)
}

/// Parse then convert a record and compare the result to the input
pub fn round_trip(schema: &Schema, input: Value, strict: bool) -> Result<RoundTripReport> {
    let converted = convert_record(schema, input.clone(), strict)?;
    let empty = serde_json::Map::new();
    let before = input.as_object().unwrap_or(&empty);
    let after = converted.as_object().unwrap_or(&empty);

    let mut lost = Vec::new();
    let mut changed = Vec::new();
    for (key, value) in before {
        match after.get(key) {
            None => lost.push(key.clone()),
            Some(result) if result != value => changed.push(KeyChange {
                key: key.clone(),
                before: value.clone(),
                after: result.clone(),
            }),
            Some(_) => {}
        }
    }
    let added = after
        .keys()
        .filter(|key| !before.contains_key(*key))
        .cloned()
        .collect();

    Ok(RoundTripReport {
        schema: schema.name(),
        lost,
        changed,
        added,
        output: converted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldmodel_core::SchemaRegistry;
    use serde_json::json;

    const DOC: &str = r#"
schemas:
  User:
    fields:
      id: user_id
      name: { key: user_name, default: "" }
      age: { key: user_age, model: Number }
      nickname: { key: nick, optional: true, model: String }
"#;

    fn user() -> Schema {
        let registry = SchemaRegistry::from_yaml_str(DOC).expect("registry");
        registry.get("User").cloned().expect("User")
    }

    #[test]
    fn test_lossless_round_trip() {
        let report = round_trip(
            &user(),
            json!({"user_id": 1, "user_name": "Ada", "user_age": 36, "nick": "countess"}),
            false,
        )
        .expect("round trip");
        assert!(report.is_lossless());
        assert!(report.added.is_empty());
    }

    #[test]
    fn test_lossy_round_trip() {
        let report = round_trip(
            &user(),
            json!({"user_id": 1, "user_age": "36", "legacy": true}),
            false,
        )
        .expect("round trip");

        assert_eq!(report.lost, vec!["legacy".to_string()]);
        assert_eq!(
            report.changed,
            vec![KeyChange {
                key: "user_age".into(),
                before: json!("36"),
                after: json!(36),
            }]
        );
        assert_eq!(report.added, vec!["user_name".to_string()]);
        assert!(report.output.get("nick").is_none());
    }
}
