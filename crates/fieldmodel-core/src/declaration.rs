//! Serialized schema declarations
//!
//! Schemas can be declared in a YAML or JSON document and loaded into a
//! [`SchemaRegistry`]. Field shorthand follows the in-code declaration form:
//! a string is a source key unless it names a primitive or a schema of the
//! same document, and a one-element list is a sequence model.
//!
//! ```yaml
//! schemas:
//!   User:
//!     fields:
//!       id: user_id
//!       age: Number
//!       friend: User
//!       tags: [String]
//!       name: { key: user_name, default: "" }
//!   Admin:
//!     extends: User
//!     omit: [friend]
//!     fields:
//!       level: Number
//! ```
//!
//! Self and forward references are resolved through [`SchemaSlot`]s, so a
//! schema may nest itself or a schema declared further down.

use crate::coerce::Primitive;
use crate::compose::Composition;
use crate::config::EngineConfig;
use crate::enums::EnumSpec;
use crate::error::{Error, Result};
use crate::field::{Element, Field, Model};
use crate::fields::{bool_int_field, json_field, split_field, JsonFieldOptions, Recursion, DEFAULT_SEPARATOR};
use crate::normalize::FieldDecl;
use crate::options::{Handler, SchemaOptions};
use crate::schema::{Schema, SchemaRef, SchemaSlot};
use crate::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::Path;
use std::sync::Arc;

/// Top-level declaration document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeclarationDocument {
    #[serde(default)]
    pub schemas: IndexMap<String, SchemaDecl>,
}

/// One named schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaDecl {
    /// Base schema, declared earlier in the same document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    /// Carry only these base fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pick: Option<Vec<String>>,
    /// Carry every base field except these
    #[serde(skip_serializing_if = "Option::is_none")]
    pub omit: Option<Vec<String>>,
    pub options: OptionsDecl,
    pub fields: IndexMap<String, FieldSpec>,
}

/// Serializable subset of [`SchemaOptions`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptionsDecl {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(alias = "parseToModel", alias = "autoParse", alias = "auto_parse")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_to_model: Option<bool>,
    #[serde(alias = "convertToModel", alias = "autoConvert", alias = "auto_convert")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convert_to_model: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handler: Option<Handler>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

impl OptionsDecl {
    fn into_options(self) -> SchemaOptions {
        SchemaOptions {
            name: self.name,
            parse_to_model: self.parse_to_model,
            convert_to_model: self.convert_to_model,
            handler: self.handler,
            debug: self.debug,
            strict: self.strict,
            ..SchemaOptions::default()
        }
    }
}

/// A field as written in a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldSpec {
    Index(i64),
    /// Source key, primitive name or schema name
    Shorthand(String),
    /// `[Element]`
    Sequence(Vec<String>),
    Descriptor(Box<FieldSpecDetail>),
}

/// Full field descriptor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldSpecDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,
    pub optional: bool,
    pub readonly: bool,
    /// `false` keeps the field out of `convert` output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convert: Option<bool>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enumeration: Option<EnumSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<ExtensionSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelSpec {
    Name(String),
    Sequence(Vec<String>),
}

/// Built-in field extension applied to a descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionSpec {
    Json {
        #[serde(default)]
        remove_empty: bool,
        #[serde(default)]
        recursion: Recursion,
    },
    Split {
        #[serde(default)]
        separator: Option<String>,
    },
    BoolInt,
}

/// Named schemas loaded from a declaration document
pub struct SchemaRegistry {
    schemas: IndexMap<String, Schema>,
}

impl SchemaRegistry {
    /// Load a document from disk; `.json` files are read as JSON, anything
    /// else as YAML
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_path_in(EngineConfig::global(), path)
    }

    pub fn from_path_in(config: Arc<EngineConfig>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            message: format!("failed to read {}", path.display()),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let document = if is_json {
            serde_json::from_str(&text)?
        } else {
            serde_yaml::from_str(&text)?
        };
        tracing::debug!(path = %path.display(), "loaded declaration document");
        Self::from_document_in(config, document)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Self::from_document(serde_yaml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Self::from_document(serde_json::from_str(text)?)
    }

    pub fn from_document(document: DeclarationDocument) -> Result<Self> {
        Self::from_document_in(EngineConfig::global(), document)
    }

    /// Build every schema of the document in declaration order
    pub fn from_document_in(config: Arc<EngineConfig>, document: DeclarationDocument) -> Result<Self> {
        let mut builder = RegistryBuilder {
            config,
            slots: document
                .schemas
                .keys()
                .map(|name| (name.clone(), SchemaSlot::new(name.as_str())))
                .collect(),
            built: IndexMap::new(),
        };
        for (name, decl) in document.schemas {
            builder.build(&name, decl)?;
        }
        Ok(Self {
            schemas: builder.built,
        })
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    /// Schema names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.schemas.iter().map(|(name, schema)| (name.as_str(), schema))
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("schemas", &self.schemas.keys().collect::<Vec<_>>())
            .finish()
    }
}

struct RegistryBuilder {
    config: Arc<EngineConfig>,
    slots: IndexMap<String, SchemaSlot>,
    built: IndexMap<String, Schema>,
}

impl RegistryBuilder {
    fn build(&mut self, name: &str, decl: SchemaDecl) -> Result<()> {
        let mut fields = Vec::with_capacity(decl.fields.len());
        for (field_name, spec) in decl.fields {
            let field = self.field_decl(name, spec)?;
            fields.push((field_name, field));
        }

        let mut options = decl.options.into_options();
        if options.name.is_none() {
            options.name = Some(name.to_string());
        }

        let schema = match decl.extends.as_deref() {
            Some(base_name) => {
                let base = self.built.get(base_name).ok_or_else(|| {
                    Error::declaration(
                        format!("unknown base schema '{}'; bases must be declared first", base_name),
                        Some(name),
                    )
                })?;
                let composition = match (decl.pick, decl.omit) {
                    (Some(_), Some(_)) => {
                        return Err(Error::declaration("pick and omit are mutually exclusive", Some(name)))
                    }
                    (Some(keys), None) => Composition::Pick(keys),
                    (None, Some(keys)) => Composition::Omit(keys),
                    (None, None) => Composition::Extend,
                };
                base.compose_with(composition, fields, options)
            }
            None => {
                if decl.pick.is_some() || decl.omit.is_some() {
                    return Err(Error::declaration("pick and omit require extends", Some(name)));
                }
                Schema::define_in(Arc::clone(&self.config), fields, options)
            }
        };

        if let Some(slot) = self.slots.get(name) {
            slot.fill(&schema)?;
        }
        tracing::debug!(schema = %name, fields = schema.fields().len(), "declared schema");
        self.built.insert(name.to_string(), schema);
        Ok(())
    }

    /// Strong handle for schemas already built, a slot for self and forward references
    fn schema_ref(&self, name: &str) -> Option<SchemaRef> {
        if let Some(schema) = self.built.get(name) {
            return Some(SchemaRef::from(schema.clone()));
        }
        self.slots.get(name).map(SchemaSlot::reference)
    }

    fn field_decl(&self, schema: &str, spec: FieldSpec) -> Result<FieldDecl> {
        match spec {
            FieldSpec::Index(index) => Ok(FieldDecl::from(index)),
            FieldSpec::Shorthand(text) => Ok(match self.model_by_name(&text) {
                Some(model) => FieldDecl::Model(model),
                None => FieldDecl::Key(text),
            }),
            FieldSpec::Sequence(names) => self.sequence(schema, &names).map(FieldDecl::Model),
            FieldSpec::Descriptor(detail) => self.descriptor(schema, *detail).map(FieldDecl::Field),
        }
    }

    fn descriptor(&self, schema: &str, detail: FieldSpecDetail) -> Result<Field> {
        let mut field = Field::new();
        field.key = detail.key;
        field.optional = detail.optional;
        field.readonly = detail.readonly;
        field.enumeration = detail.enumeration;

        if let Some(model) = detail.model {
            field.model = Some(match model {
                ModelSpec::Name(name) => self.model_by_name(&name).ok_or_else(|| {
                    Error::declaration(format!("unknown model '{}'", name), Some(schema))
                })?,
                ModelSpec::Sequence(names) => self.sequence(schema, &names)?,
            });
        }
        if let Some(default) = detail.default {
            field = field.default_value(Value::from(default));
        }
        if detail.convert == Some(false) {
            field = field.skip_convert();
        }

        Ok(match detail.extension {
            Some(ExtensionSpec::Json { remove_empty, recursion }) => {
                json_field(field, JsonFieldOptions { remove_empty, recursion })
            }
            Some(ExtensionSpec::Split { separator }) => {
                split_field(field, separator.unwrap_or_else(|| DEFAULT_SEPARATOR.to_string()))
            }
            Some(ExtensionSpec::BoolInt) => bool_int_field(field),
            None => field,
        })
    }

    fn sequence(&self, schema: &str, names: &[String]) -> Result<Model> {
        let [name] = names else {
            return Err(Error::declaration(
                format!("sequence shorthand takes exactly one element type, got {}", names.len()),
                Some(schema),
            ));
        };
        let element = if let Some(kind) = primitive_named(name) {
            Element::Primitive(kind)
        } else if let Some(nested) = self.schema_ref(name) {
            Element::Nested(nested)
        } else {
            return Err(Error::declaration(
                format!("unknown element type '{}'", name),
                Some(schema),
            ));
        };
        Ok(Model::SequenceOf(element))
    }

    fn model_by_name(&self, name: &str) -> Option<Model> {
        primitive_named(name)
            .map(Model::Primitive)
            .or_else(|| self.schema_ref(name).map(Model::Nested))
    }
}

/// Constructor-style primitive names only; lowercase words stay source keys
fn primitive_named(name: &str) -> Option<Primitive> {
    Primitive::ALL.into_iter().find(|kind| kind.name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::LabelEnumFactory;
    use serde_json::json;
    use std::io::Write;

    const USERS: &str = r#"
schemas:
  User:
    options: { handler: update }
    fields:
      id: user_id
      age: Number
      friend: { key: best_friend, model: User, optional: true }
      tags: [String]
      name: { key: user_name, default: "" }
      status: { key: status, enum: [{ key: A, value: 1, label: Alpha }] }
  Admin:
    extends: User
    omit: [friend]
    options: { strict: true }
    fields:
      level: Number
"#;

    fn registry() -> SchemaRegistry {
        let config = EngineConfig::new().with_enum_factory(LabelEnumFactory).into_shared();
        let document: DeclarationDocument = serde_yaml::from_str(USERS).unwrap();
        SchemaRegistry::from_document_in(config, document).unwrap()
    }

    #[test]
    fn test_shorthand_resolution() {
        let registry = registry();
        let user = registry.get("User").unwrap();
        assert_eq!(user.name(), "User");
        assert!(user.field("id").is_some_and(|f| f.model.is_none()));
        assert_eq!(user.field("age").and_then(|f| f.model.as_ref()).map(Model::type_name), Some("Number".to_string()));
        assert_eq!(
            user.field("tags").and_then(|f| f.model.as_ref()).map(Model::type_name),
            Some("Array<String>".to_string())
        );
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["User", "Admin"]);
    }

    #[test]
    fn test_self_reference_parses_nested() {
        let registry = registry();
        let user = registry.get("User").unwrap();
        let instance = user
            .parse(json!({"user_id": 1, "best_friend": {"user_id": 2, "user_name": "Bo"}}))
            .unwrap();
        let friend = instance.get("friend").unwrap();
        assert_eq!(friend.field("id"), Some(Value::from(2)));
        assert_eq!(friend.field("name"), Some(Value::from("Bo")));
        assert_eq!(
            user.enumeration("status").unwrap().unwrap().label(&json!(1)).as_deref(),
            Some("Alpha")
        );
    }

    #[test]
    fn test_extends_with_omit() {
        let registry = registry();
        let admin = registry.get("Admin").unwrap();
        assert_eq!(
            admin.fields().keys().collect::<Vec<_>>(),
            vec!["id", "age", "tags", "name", "status", "level"]
        );
        assert_eq!(admin.name(), "Admin");
        assert_eq!(admin.options().strict, Some(true));
        assert!(admin.parse(json!({"level": "high"})).is_err());
    }

    #[test]
    fn test_json_extension_recursion() {
        let parse = |yaml: &str| serde_yaml::from_str::<ExtensionSpec>(yaml).unwrap();
        assert_eq!(
            parse("json: { remove_empty: true }"),
            ExtensionSpec::Json { remove_empty: true, recursion: Recursion::Depth(0) }
        );
        assert_eq!(
            parse("json: { remove_empty: true, recursion: true }"),
            ExtensionSpec::Json { remove_empty: true, recursion: Recursion::Unbounded }
        );
        assert_eq!(
            parse("json: { recursion: 2 }"),
            ExtensionSpec::Json { remove_empty: false, recursion: Recursion::Depth(2) }
        );
    }

    #[test]
    fn test_lowercase_words_are_keys() {
        let registry = SchemaRegistry::from_json_str(
            r#"{"schemas": {"Item": {"fields": {"label": "text", "count": "Number", "rank": 3}}}}"#,
        )
        .unwrap();
        let item = registry.get("Item").unwrap();
        assert_eq!(item.field("label").and_then(|f| f.key.as_deref()), Some("text"));
        assert!(item.field("label").is_some_and(|f| f.model.is_none()));
        assert_eq!(item.field("rank").and_then(|f| f.key.as_deref()), Some("3"));
    }

    #[test]
    fn test_declaration_errors() {
        let unknown_base = "schemas:\n  A:\n    extends: Missing\n    fields: {}\n";
        assert!(matches!(
            SchemaRegistry::from_yaml_str(unknown_base),
            Err(Error::Declaration { .. })
        ));

        let bad_sequence = "schemas:\n  A:\n    fields:\n      tags: [String, Number]\n";
        assert!(matches!(
            SchemaRegistry::from_yaml_str(bad_sequence),
            Err(Error::Declaration { .. })
        ));

        let unknown_model = "schemas:\n  A:\n    fields:\n      b: { model: Nope }\n";
        assert!(matches!(
            SchemaRegistry::from_yaml_str(unknown_model),
            Err(Error::Declaration { .. })
        ));

        assert!(matches!(
            SchemaRegistry::from_yaml_str("schemas: [1, 2]"),
            Err(Error::Yaml { .. })
        ));
    }

    #[test]
    fn test_from_path_picks_format() {
        let mut yaml = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        yaml.write_all(USERS.as_bytes()).unwrap();
        let registry = SchemaRegistry::from_path(yaml.path()).unwrap();
        assert_eq!(registry.len(), 2);

        let mut json_file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        json_file
            .write_all(br#"{"schemas": {"Tag": {"fields": {"id": "tag_id"}}}}"#)
            .unwrap();
        let registry = SchemaRegistry::from_path(json_file.path()).unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["Tag"]);

        let missing = SchemaRegistry::from_path("/nonexistent/fieldmodel/schemas.yaml");
        assert!(matches!(missing, Err(Error::Io { .. })));
    }
}
