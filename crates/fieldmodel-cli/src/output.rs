//! Output formatting and writing utilities
//!
//! Results are written as JSON, YAML or a human-readable rendering. The
//! round-trip report and the schema field table have dedicated human layouts;
//! everything else falls back to pretty JSON.

use crate::cli::OutputFormat;
use crate::error::Result;
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};
use tracing::trace;

/// A source key whose value did not survive parse then convert unchanged
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyChange {
    pub key: String,
    pub before: Value,
    pub after: Value,
}

/// Outcome of the `roundtrip` command
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundTripReport {
    pub schema: String,
    /// Input keys missing from the converted output
    pub lost: Vec<String>,
    /// Input keys whose value differs after conversion
    pub changed: Vec<KeyChange>,
    /// Output keys that were not in the input
    pub added: Vec<String>,
    pub output: Value,
}

impl RoundTripReport {
    pub fn is_lossless(&self) -> bool {
        self.lost.is_empty() && self.changed.is_empty()
    }
}

/// One row of the `inspect` field table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldRow {
    pub name: String,
    pub key: String,
    pub model: Option<String>,
    pub flags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enum_labels: Vec<String>,
}

/// Normalized field table of one schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaTable {
    pub schema: String,
    pub fields: Vec<FieldRow>,
}

/// Formatting of command results per output format
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    fn format_round_trip(&self, report: &RoundTripReport) -> Result<String>;

    fn format_schema_table(&self, table: &SchemaTable) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty | OutputFormat::Human => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
        }
    }

    fn format_round_trip(&self, report: &RoundTripReport) -> Result<String> {
        match self {
            OutputFormat::Human => format_round_trip_human(report),
            _ => self.format(report),
        }
    }

    fn format_schema_table(&self, table: &SchemaTable) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_schema_table_human(table)),
            _ => self.format(table),
        }
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer on stdout
    pub fn new(format: OutputFormat, use_color: bool) -> Self {
        Self::with_writer(format, use_color, Box::new(io::stdout()))
    }

    /// Create an output writer with a custom writer
    pub fn with_writer(format: OutputFormat, use_color: bool, writer: Box<dyn Write>) -> Self {
        Self {
            format,
            use_color,
            writer,
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write raw output
    pub fn write(&mut self, content: &str) -> Result<()> {
        write!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let formatted = self.format.format(value)?;
        trace!(bytes = formatted.len(), "Writing data");
        if formatted.ends_with('\n') {
            self.write(&formatted)
        } else {
            self.writeln(&formatted)
        }
    }

    pub fn round_trip(&mut self, report: &RoundTripReport) -> Result<()> {
        let formatted = self.format.format_round_trip(report)?;
        if self.format == OutputFormat::Human && self.use_color {
            let colored = if report.is_lossless() {
                formatted.green().to_string()
            } else {
                formatted.yellow().to_string()
            };
            return self.write(&colored);
        }
        self.write(&formatted)
    }

    pub fn schema_table(&mut self, table: &SchemaTable) -> Result<()> {
        let formatted = self.format.format_schema_table(table)?;
        self.write(&formatted)
    }
}

/// Format a round-trip report for human reading
fn format_round_trip_human(report: &RoundTripReport) -> Result<String> {
    let mut output = String::new();

    if report.is_lossless() {
        output.push_str(&format!("✓ {} round trip is lossless\n", report.schema));
    } else {
        output.push_str(&format!(
            "✗ {} round trip lost {} key(s) and changed {} key(s)\n",
            report.schema,
            report.lost.len(),
            report.changed.len()
        ));
    }

    for key in &report.lost {
        output.push_str(&format!("  - {}\n", key));
    }
    for change in &report.changed {
        output.push_str(&format!(
            "  ~ {}: {} -> {}\n",
            change.key,
            format_value_compact(&change.before),
            format_value_compact(&change.after)
        ));
    }
    for key in &report.added {
        output.push_str(&format!("  + {}\n", key));
    }

    output.push('\n');
    output.push_str(&serde_json::to_string_pretty(&report.output)?);
    output.push('\n');
    Ok(output)
}

/// Format a schema field table for human reading
fn format_schema_table_human(table: &SchemaTable) -> String {
    let headers = ["FIELD", "KEY", "MODEL", "FLAGS", "ENUM"];
    let rows: Vec<[String; 5]> = table
        .fields
        .iter()
        .map(|row| {
            [
                row.name.clone(),
                row.key.clone(),
                row.model.clone().unwrap_or_else(|| "-".to_string()),
                row.flags.join(","),
                row.enum_labels.join(", "),
            ]
        })
        .collect();

    let mut widths = headers.map(str::len);
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let render = |cells: &[String]| {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:width$}", cell, width = widths[i]))
            .collect::<Vec<_>>()
            .join(" │ ")
            .trim_end()
            .to_string()
    };

    let mut output = format!("{} ({} fields)\n", table.schema, table.fields.len());
    output.push_str(&render(&headers.map(str::to_string)));
    output.push('\n');
    output.push_str(
        &widths
            .iter()
            .map(|w| "─".repeat(*w))
            .collect::<Vec<_>>()
            .join("─┼─"),
    );
    output.push('\n');
    for row in &rows {
        output.push_str(&render(row));
        output.push('\n');
    }
    output
}

/// Format a JSON value in a compact, human-readable way
fn format_value_compact(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        Value::Array(arr) if arr.len() > 3 => format!("[{} items]", arr.len()),
        Value::Object(obj) if obj.len() > 2 => format!("{{{} fields}}", obj.len()),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).expect("utf8")
        }
    }

    fn report() -> RoundTripReport {
        RoundTripReport {
            schema: "User".into(),
            lost: vec!["legacy_flag".into()],
            changed: vec![KeyChange {
                key: "user_age".into(),
                before: json!("36"),
                after: json!(36),
            }],
            added: vec!["user_tags".into()],
            output: json!({"user_age": 36, "user_tags": []}),
        }
    }

    #[test]
    fn test_round_trip_human() {
        let formatted = format_round_trip_human(&report()).expect("format");
        assert!(formatted.starts_with("✗ User round trip lost 1 key(s) and changed 1 key(s)"));
        assert!(formatted.contains("  - legacy_flag\n"));
        assert!(formatted.contains("  ~ user_age: \"36\" -> 36\n"));
        assert!(formatted.contains("  + user_tags\n"));
    }

    #[test]
    fn test_lossless_round_trip_human() {
        let report = RoundTripReport {
            schema: "Tag".into(),
            lost: vec![],
            changed: vec![],
            added: vec![],
            output: json!({"tag_id": 1}),
        };
        let formatted = format_round_trip_human(&report).expect("format");
        assert!(formatted.starts_with("✓ Tag round trip is lossless"));
    }

    #[test]
    fn test_schema_table_human() {
        let table = SchemaTable {
            schema: "User".into(),
            fields: vec![
                FieldRow {
                    name: "id".into(),
                    key: "user_id".into(),
                    model: None,
                    flags: vec![],
                    enum_labels: vec![],
                },
                FieldRow {
                    name: "status".into(),
                    key: "status".into(),
                    model: Some("Number".into()),
                    flags: vec!["optional".into(), "default".into()],
                    enum_labels: vec!["A=Alpha".into()],
                },
            ],
        };
        let formatted = format_schema_table_human(&table);
        let lines: Vec<&str> = formatted.lines().collect();
        assert_eq!(lines[0], "User (2 fields)");
        assert!(lines[1].starts_with("FIELD  │ KEY     │ MODEL  │ FLAGS"));
        assert!(lines[3].starts_with("id     │ user_id │ -"));
        assert!(lines[4].ends_with("optional,default │ A=Alpha"));
    }

    #[test]
    fn test_json_data_is_one_line() {
        let buffer = SharedBuffer::default();
        let mut writer = OutputWriter::with_writer(OutputFormat::Json, false, Box::new(buffer.clone()));
        writer.data(&json!({"id": 1})).expect("data");
        assert_eq!(buffer.contents(), "{\"id\":1}\n");
    }

    #[test]
    fn test_yaml_round_trip_report() {
        let buffer = SharedBuffer::default();
        let mut writer = OutputWriter::with_writer(OutputFormat::Yaml, false, Box::new(buffer.clone()));
        writer.round_trip(&report()).expect("report");
        let parsed: Value = serde_yaml::from_str(&buffer.contents()).expect("yaml");
        assert_eq!(parsed["lost"], json!(["legacy_flag"]));
        assert_eq!(parsed["changed"][0]["key"], json!("user_age"));
    }

    #[test]
    fn test_human_table_without_color() {
        let buffer = SharedBuffer::default();
        let mut writer = OutputWriter::with_writer(OutputFormat::Human, false, Box::new(buffer.clone()));
        writer
            .schema_table(&SchemaTable {
                schema: "Tag".into(),
                fields: vec![],
            })
            .expect("table");
        assert!(buffer.contents().starts_with("Tag (0 fields)\nFIELD │ KEY │ MODEL │ FLAGS │ ENUM\n"));
    }
}
