//! Inspect command handler

use super::utils::{load_registry, select_schema};
use crate::cli::InspectArgs;
use crate::config::Config;
use crate::error::Result;
use crate::logging::{command_span, Timer};
use crate::output::{FieldRow, OutputWriter, SchemaTable};
use fieldmodel_core::field::ConvertRule;
use fieldmodel_core::{Field, Schema};

/// Handle the inspect command
pub fn handle_inspect(args: InspectArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let timer = Timer::new(command_span("inspect", args.target.schema.as_deref()));
    let _entered = timer.span().enter();

    let registry = load_registry(&args.target, config)?;
    let schema = select_schema(&registry, args.target.schema.as_deref())?;
    let table = schema_table(&schema)?;
    output.schema_table(&table)
}

/// Build the normalized field table of a schema
pub fn schema_table(schema: &Schema) -> Result<SchemaTable> {
    let mut fields = Vec::with_capacity(schema.fields().len());
    for (name, field) in schema.fields().iter() {
        let enum_labels = match schema.enumeration(name)? {
            Some(lookup) => lookup
                .keys()
                .into_iter()
                .map(|key| {
                    let label = lookup
                        .get(key)
                        .and_then(|value| lookup.label(value))
                        .unwrap_or_else(|| key.to_string());
                    format!("{}={}", key, label)
                })
                .collect(),
            None => Vec::new(),
        };
        fields.push(FieldRow {
            name: name.to_string(),
            key: field.source_key(name).to_string(),
            model: field.model.as_ref().map(|model| model.type_name()),
            flags: field_flags(field),
            enum_labels,
        });
    }
    Ok(SchemaTable {
        schema: schema.name(),
        fields,
    })
}

fn field_flags(field: &Field) -> Vec<String> {
    let mut flags = Vec::new();
    if field.optional {
        flags.push("optional");
    }
    if field.readonly || field.is_readonly_accessor() {
        flags.push("readonly");
    }
    if field.has_default() {
        flags.push("default");
    }
    if field.has_getter() {
        flags.push("computed");
    }
    if !field.is_enumerable() {
        flags.push("hidden");
    }
    if field.parse.is_some() {
        flags.push("parse-hook");
    }
    match field.convert {
        Some(ConvertRule::Skip) => flags.push("no-convert"),
        Some(ConvertRule::Hook(_)) => flags.push("convert-hook"),
        None => {}
    }
    flags.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldmodel_core::SchemaRegistry;

    const DOC: &str = r#"
schemas:
  Order:
    fields:
      id: order_id
      status:
        key: order_status
        model: Number
        enum:
          - { key: OPEN, value: 1, label: Open }
          - { key: DONE, value: 2 }
      note: { key: memo, optional: true, default: "" }
      flags: { key: flag_list, extension: { split: {} } }
"#;

    #[test]
    fn test_schema_table() {
        let registry = SchemaRegistry::from_document_in(
            Config::default().engine(),
            serde_yaml::from_str(DOC).expect("document"),
        )
        .expect("registry");
        let table = schema_table(registry.get("Order").expect("Order")).expect("table");

        assert_eq!(table.schema, "Order");
        let names: Vec<&str> = table.fields.iter().map(|row| row.name.as_str()).collect();
        assert_eq!(names, vec!["id", "status", "note", "flags"]);

        let id = &table.fields[0];
        assert_eq!(id.key, "order_id");
        assert_eq!(id.model, None);
        assert!(id.flags.is_empty());

        let status = &table.fields[1];
        assert_eq!(status.model.as_deref(), Some("Number"));
        assert_eq!(status.enum_labels, vec!["OPEN=Open", "DONE=DONE"]);

        let note = &table.fields[2];
        assert_eq!(note.flags, vec!["optional", "default"]);

        let flags = &table.fields[3];
        assert_eq!(flags.flags, vec!["parse-hook", "convert-hook"]);
    }
}
