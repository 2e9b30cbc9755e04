//! End-to-end runs of the `fieldmodel` binary

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const SCHEMAS: &str = r#"
schemas:
  User:
    fields:
      id: user_id
      name: { key: user_name, default: "" }
      age: { key: user_age, model: Number }
      tags: { key: user_tags, model: [String] }
  Tag:
    fields:
      id: tag_id
"#;

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}

fn fieldmodel(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fieldmodel"))
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("FIELDMODEL_CONFIG")
        .args(args)
        .output()
        .expect("run fieldmodel")
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("json stdout")
}

#[test]
fn test_parse_prints_logical_shape() {
    let dir = TempDir::new().expect("temp dir");
    write(&dir, "schemas.yaml", SCHEMAS);
    write(&dir, "user.json", r#"{"user_id": 1, "user_age": "36"}"#);

    let output = fieldmodel(
        dir.path(),
        &["-o", "json", "parse", "--schemas", "schemas.yaml", "--schema", "User", "user.json"],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        stdout_json(&output),
        json!({"id": 1, "name": "", "age": 36, "tags": []})
    );
}

#[test]
fn test_convert_list_input() {
    let dir = TempDir::new().expect("temp dir");
    write(&dir, "schemas.yaml", SCHEMAS);
    write(&dir, "users.yaml", "- user_id: 1\n  user_tags: [a]\n- user_id: 2\n");

    let output = fieldmodel(
        dir.path(),
        &["-o", "json", "convert", "--schemas", "schemas.yaml", "--schema", "User", "users.yaml"],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        stdout_json(&output),
        json!([
            {"user_id": 1, "user_name": "", "user_age": 0, "user_tags": ["a"]},
            {"user_id": 2, "user_name": "", "user_age": 0, "user_tags": []}
        ])
    );
}

#[test]
fn test_roundtrip_reports_lost_keys() {
    let dir = TempDir::new().expect("temp dir");
    write(&dir, "schemas.yaml", SCHEMAS);
    write(&dir, "tag.json", r#"{"tag_id": 4, "color": "red"}"#);

    let output = fieldmodel(
        dir.path(),
        &["-o", "json", "roundtrip", "--schemas", "schemas.yaml", "--schema", "Tag", "tag.json"],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let report = stdout_json(&output);
    assert_eq!(report["lost"], json!(["color"]));
    assert_eq!(report["output"], json!({"tag_id": 4}));
}

#[test]
fn test_config_file_sets_output_format() {
    let dir = TempDir::new().expect("temp dir");
    write(&dir, "schemas.yaml", SCHEMAS);
    write(&dir, "fieldmodel.yaml", "output:\n  format: json\n");

    let output = fieldmodel(dir.path(), &["inspect", "--schemas", "schemas.yaml", "--schema", "Tag"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        stdout_json(&output),
        json!({"schema": "Tag", "fields": [{"name": "id", "key": "tag_id", "model": null, "flags": []}]})
    );
}

#[test]
fn test_exit_codes() {
    let dir = TempDir::new().expect("temp dir");
    write(&dir, "schemas.yaml", SCHEMAS);
    write(&dir, "broken.yaml", "schemas:\n  A:\n    fields:\n      x: [Missing]\n");
    write(&dir, "user.json", r#"{"user_age": "old"}"#);

    let ambiguous = fieldmodel(dir.path(), &["inspect", "--schemas", "schemas.yaml"]);
    assert_eq!(ambiguous.status.code(), Some(2));

    let missing = fieldmodel(dir.path(), &["inspect", "--schemas", "nope.yaml"]);
    assert_eq!(missing.status.code(), Some(3));

    let broken = fieldmodel(dir.path(), &["inspect", "--schemas", "broken.yaml"]);
    assert_eq!(broken.status.code(), Some(4));

    let strict = fieldmodel(
        dir.path(),
        &["parse", "--schemas", "schemas.yaml", "--schema", "User", "--strict", "user.json"],
    );
    assert_eq!(strict.status.code(), Some(5));
    assert!(String::from_utf8_lossy(&strict.stderr).contains("Type mismatch for field \"age\""));
}
