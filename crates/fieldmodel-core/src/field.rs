//! Field descriptors
//!
//! A [`Field`] describes one logical field of a schema: where its raw value
//! comes from (`key`), what it is coerced into (`model`), how absent values
//! are filled (`default`), optional parse/convert hooks, flags, an optional
//! accessor pair for computed fields, and an optional enum spec.
//!
//! Copyright (c) 2025 Fieldmodel Team
//! Licensed under the Apache-2.0 license
//!
//! # Examples
//!
//! ```
//! use fieldmodel_core::{Field, Primitive, Model};
//!
//! let tags = Field::keyed("user_tags").model(Model::sequence_of(Primitive::Text));
//! let name = Field::keyed("user_name").default_value("").optional();
//! assert_eq!(tags.key.as_deref(), Some("user_tags"));
//! assert!(name.optional);
//! ```

use crate::coerce::Primitive;
use crate::enums::EnumSpec;
use crate::error::Result;
use crate::instance::Instance;
use crate::schema::{Schema, SchemaRef};
use crate::value::Value;
use serde_json::Value as JsonValue;
use std::fmt;
use std::rc::Rc;

/// Context handed to default factories and parse hooks
pub struct FieldContext<'a> {
    /// Instance being populated
    pub target: &'a Instance,
    /// Logical field name
    pub field: &'a str,
    /// The whole raw payload of the current ingestion call
    pub data: &'a Value,
    pub descriptor: &'a Field,
}

/// Context handed to convert hooks
pub struct ConvertContext<'a> {
    pub target: &'a Instance,
    pub field: &'a str,
    pub descriptor: &'a Field,
}

pub type DefaultFn = Rc<dyn Fn(&FieldContext<'_>) -> Option<Value>>;
pub type ParseFn = Rc<dyn Fn(&FieldContext<'_>, Option<&Value>) -> Result<Option<Value>>>;
pub type ConvertFn = Rc<dyn Fn(&ConvertContext<'_>, Option<&Value>) -> Result<Option<JsonValue>>>;
pub type GetterFn = Rc<dyn Fn(&Instance) -> Value>;
pub type SetterFn = Rc<dyn Fn(&Instance, Value) -> Result<()>>;

/// Element type of a sequence model
#[derive(Clone)]
pub enum Element {
    Primitive(Primitive),
    Nested(SchemaRef),
}

impl Element {
    pub fn name(&self) -> String {
        match self {
            Element::Primitive(kind) => kind.name().to_string(),
            Element::Nested(schema) => schema.name(),
        }
    }
}

impl From<Primitive> for Element {
    fn from(kind: Primitive) -> Self {
        Element::Primitive(kind)
    }
}

impl From<Schema> for Element {
    fn from(schema: Schema) -> Self {
        Element::Nested(SchemaRef::from(schema))
    }
}

impl From<&Schema> for Element {
    fn from(schema: &Schema) -> Self {
        Element::Nested(SchemaRef::from(schema.clone()))
    }
}

impl From<SchemaRef> for Element {
    fn from(schema: SchemaRef) -> Self {
        Element::Nested(schema)
    }
}

/// What a field's value is coerced into
#[derive(Clone)]
pub enum Model {
    Primitive(Primitive),
    Nested(SchemaRef),
    /// Homogeneous ordered sequence of one element type
    SequenceOf(Element),
}

impl Model {
    pub fn sequence_of(element: impl Into<Element>) -> Self {
        Model::SequenceOf(element.into())
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Model::SequenceOf(_))
    }

    /// Primitive kind of the field, or of its elements for a sequence
    pub fn primitive(&self) -> Option<Primitive> {
        match self {
            Model::Primitive(kind) | Model::SequenceOf(Element::Primitive(kind)) => Some(*kind),
            _ => None,
        }
    }

    /// Nested schema of the field, or of its elements for a sequence
    pub fn schema_ref(&self) -> Option<&SchemaRef> {
        match self {
            Model::Nested(schema) | Model::SequenceOf(Element::Nested(schema)) => Some(schema),
            _ => None,
        }
    }

    /// Display name such as `Number`, `Array<String>` or a schema name
    pub fn type_name(&self) -> String {
        match self {
            Model::Primitive(kind) => kind.name().to_string(),
            Model::Nested(schema) => schema.name(),
            Model::SequenceOf(element) => format!("Array<{}>", element.name()),
        }
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name())
    }
}

impl From<Primitive> for Model {
    fn from(kind: Primitive) -> Self {
        Model::Primitive(kind)
    }
}

impl From<Schema> for Model {
    fn from(schema: Schema) -> Self {
        Model::Nested(SchemaRef::from(schema))
    }
}

impl From<&Schema> for Model {
    fn from(schema: &Schema) -> Self {
        Model::Nested(SchemaRef::from(schema.clone()))
    }
}

impl From<SchemaRef> for Model {
    fn from(schema: SchemaRef) -> Self {
        Model::Nested(schema)
    }
}

/// Default applied when the raw value is absent
#[derive(Clone)]
pub enum DefaultValue {
    Value(Value),
    Factory(DefaultFn),
}

/// Output rule for a field
#[derive(Clone)]
pub enum ConvertRule {
    /// Never emit this field
    Skip,
    Hook(ConvertFn),
}

/// Getter/setter pair of a computed field
#[derive(Clone)]
pub struct Accessor {
    pub get: Option<GetterFn>,
    pub set: Option<SetterFn>,
    /// Whether the field shows up in `keys()` and serialized output
    pub enumerable: bool,
}

impl Default for Accessor {
    fn default() -> Self {
        Self {
            get: None,
            set: None,
            enumerable: true,
        }
    }
}

/// Descriptor of one logical field
#[derive(Clone, Default)]
pub struct Field {
    /// Source (wire-side) field name
    pub key: Option<String>,
    pub model: Option<Model>,
    pub default: Option<DefaultValue>,
    pub parse: Option<ParseFn>,
    pub convert: Option<ConvertRule>,
    /// Dropped from `convert` output when empty
    pub optional: bool,
    /// Rejects direct writes through `Instance::set`
    pub readonly: bool,
    pub accessor: Option<Accessor>,
    pub enumeration: Option<EnumSpec>,
}

impl Field {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field read from the given source key
    pub fn keyed(key: impl Into<String>) -> Self {
        Self::new().key(key)
    }

    /// Field with a model and no explicit key
    pub fn of(model: impl Into<Model>) -> Self {
        Self::new().model(model)
    }

    /// Read-only computed field
    pub fn computed<F>(getter: F) -> Self
    where
        F: Fn(&Instance) -> Value + 'static,
    {
        Self::new().getter(getter)
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<Model>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Value(value.into()));
        self
    }

    pub fn default_with<F>(mut self, factory: F) -> Self
    where
        F: Fn(&FieldContext<'_>) -> Option<Value> + 'static,
    {
        self.default = Some(DefaultValue::Factory(Rc::new(factory)));
        self
    }

    /// Custom parse hook. Its result is stored verbatim.
    pub fn parse_with<F>(mut self, hook: F) -> Self
    where
        F: Fn(&FieldContext<'_>, Option<&Value>) -> Result<Option<Value>> + 'static,
    {
        self.parse = Some(Rc::new(hook));
        self
    }

    /// Custom convert hook. Returning `None` omits the key.
    pub fn convert_with<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ConvertContext<'_>, Option<&Value>) -> Result<Option<JsonValue>> + 'static,
    {
        self.convert = Some(ConvertRule::Hook(Rc::new(hook)));
        self
    }

    pub fn skip_convert(mut self) -> Self {
        self.convert = Some(ConvertRule::Skip);
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    pub fn getter<F>(mut self, getter: F) -> Self
    where
        F: Fn(&Instance) -> Value + 'static,
    {
        self.accessor.get_or_insert_with(Accessor::default).get = Some(Rc::new(getter));
        self
    }

    pub fn setter<F>(mut self, setter: F) -> Self
    where
        F: Fn(&Instance, Value) -> Result<()> + 'static,
    {
        self.accessor.get_or_insert_with(Accessor::default).set = Some(Rc::new(setter));
        self
    }

    /// Keep an accessor out of `keys()` and serialized output
    pub fn hidden(mut self) -> Self {
        self.accessor.get_or_insert_with(Accessor::default).enumerable = false;
        self
    }

    pub fn enumeration(mut self, spec: EnumSpec) -> Self {
        self.enumeration = Some(spec);
        self
    }

    /// Source key, falling back to the logical name
    pub fn source_key<'a>(&'a self, name: &'a str) -> &'a str {
        self.key.as_deref().unwrap_or(name)
    }

    pub fn getter_fn(&self) -> Option<&GetterFn> {
        self.accessor.as_ref().and_then(|accessor| accessor.get.as_ref())
    }

    pub fn setter_fn(&self) -> Option<&SetterFn> {
        self.accessor.as_ref().and_then(|accessor| accessor.set.as_ref())
    }

    pub fn has_getter(&self) -> bool {
        self.getter_fn().is_some()
    }

    /// Getter without a setter: computed, never stored
    pub fn is_readonly_accessor(&self) -> bool {
        self.has_getter() && self.setter_fn().is_none()
    }

    /// A null default counts as no default
    pub fn has_default(&self) -> bool {
        match &self.default {
            Some(DefaultValue::Value(value)) => !value.is_null(),
            Some(DefaultValue::Factory(_)) => true,
            None => false,
        }
    }

    pub fn is_enumerable(&self) -> bool {
        self.accessor.as_ref().map_or(true, |accessor| accessor.enumerable)
    }

    pub(crate) fn resolve_default(&self, ctx: &FieldContext<'_>) -> Option<Value> {
        match &self.default {
            Some(DefaultValue::Value(value)) => Some(value.clone()),
            Some(DefaultValue::Factory(factory)) => factory(ctx),
            None => None,
        }
    }
}

impl From<&str> for Field {
    fn from(key: &str) -> Self {
        Field::keyed(key)
    }
}

impl From<String> for Field {
    fn from(key: String) -> Self {
        Field::keyed(key)
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("key", &self.key)
            .field("model", &self.model)
            .field("has_default", &self.has_default())
            .field("has_parse", &self.parse.is_some())
            .field(
                "convert",
                &match &self.convert {
                    None => "default",
                    Some(ConvertRule::Skip) => "skip",
                    Some(ConvertRule::Hook(_)) => "hook",
                },
            )
            .field("optional", &self.optional)
            .field("readonly", &self.readonly)
            .field("getter", &self.has_getter())
            .field("setter", &self.setter_fn().is_some())
            .field("enum", &self.enumeration.is_some())
            .finish()
    }
}
