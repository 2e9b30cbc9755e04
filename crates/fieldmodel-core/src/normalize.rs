//! Schema normalizer
//!
//! Turns a raw declaration, where each field may be written as shorthand, into
//! an ordered [`FieldTable`] of full [`Field`] descriptors.
//!
//! - a source-key string or integer becomes `{ key }`
//! - a primitive, nested schema or sequence model becomes `{ key: name, model }`
//! - a full descriptor passes through; its logical name becomes the key when it
//!   has neither a key nor a getter
//!
//! Declarations are consumed by value, so normalization never touches the
//! caller's copy, and normalizing an already normalized table is a no-op.

use crate::coerce::Primitive;
use crate::field::{Field, Model};
use crate::schema::{Schema, SchemaRef};
use indexmap::IndexMap;
use std::fmt;

/// One raw field declaration
#[derive(Clone)]
pub enum FieldDecl {
    /// Pure rename from a source key
    Key(String),
    Model(Model),
    Field(Field),
}

impl From<&str> for FieldDecl {
    fn from(key: &str) -> Self {
        FieldDecl::Key(key.to_string())
    }
}

impl From<String> for FieldDecl {
    fn from(key: String) -> Self {
        FieldDecl::Key(key)
    }
}

impl From<i64> for FieldDecl {
    fn from(key: i64) -> Self {
        FieldDecl::Key(key.to_string())
    }
}

impl From<i32> for FieldDecl {
    fn from(key: i32) -> Self {
        FieldDecl::Key(key.to_string())
    }
}

impl From<Primitive> for FieldDecl {
    fn from(kind: Primitive) -> Self {
        FieldDecl::Model(Model::Primitive(kind))
    }
}

impl From<Model> for FieldDecl {
    fn from(model: Model) -> Self {
        FieldDecl::Model(model)
    }
}

impl From<Schema> for FieldDecl {
    fn from(schema: Schema) -> Self {
        FieldDecl::Model(Model::from(schema))
    }
}

impl From<&Schema> for FieldDecl {
    fn from(schema: &Schema) -> Self {
        FieldDecl::Model(Model::from(schema))
    }
}

impl From<SchemaRef> for FieldDecl {
    fn from(schema: SchemaRef) -> Self {
        FieldDecl::Model(Model::Nested(schema))
    }
}

impl From<Field> for FieldDecl {
    fn from(field: Field) -> Self {
        FieldDecl::Field(field)
    }
}

impl FieldDecl {
    fn into_field(self, name: &str) -> Field {
        match self {
            FieldDecl::Key(key) => Field::keyed(key),
            FieldDecl::Model(model) => Field::keyed(name).model(model),
            FieldDecl::Field(mut field) => {
                if field.key.is_none() && !field.has_getter() {
                    field.key = Some(name.to_string());
                }
                field
            }
        }
    }
}

/// Ordered table of normalized field descriptors
///
/// Declaration order is semantically relevant: ingestion and conversion
/// visit fields in this order.
#[derive(Clone, Default)]
pub struct FieldTable {
    entries: IndexMap<String, Field>,
}

impl FieldTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.entries.iter().map(|(name, field)| (name.as_str(), field))
    }

    /// Insert or replace a field. A replaced field keeps its position.
    pub(crate) fn insert(&mut self, name: String, field: Field) {
        self.entries.insert(name, field);
    }

    pub(crate) fn remove(&mut self, name: &str) {
        self.entries.shift_remove(name);
    }
}

impl IntoIterator for FieldTable {
    type Item = (String, Field);
    type IntoIter = indexmap::map::IntoIter<String, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl fmt::Debug for FieldTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

/// Normalize a raw declaration into a field table
pub fn normalize<I, K, D>(declarations: I) -> FieldTable
where
    I: IntoIterator<Item = (K, D)>,
    K: Into<String>,
    D: Into<FieldDecl>,
{
    let mut table = FieldTable::new();
    for (name, declaration) in declarations {
        let name = name.into();
        let field = declaration.into().into_field(&name);
        table.insert(name, field);
    }
    table
}

/// Build a field declaration list with mixed shorthand values
///
/// ```
/// use fieldmodel_core::{fields, normalize, Field, Primitive};
///
/// let table = normalize(fields! {
///     "id" => "user_id",
///     "age" => Primitive::Number,
///     "name" => Field::keyed("user_name").default_value(""),
/// });
/// assert_eq!(table.len(), 3);
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        ::std::vec::Vec::<(::std::string::String, $crate::FieldDecl)>::new()
    };
    ($($name:expr => $decl:expr),* $(,)?) => {
        vec![$(
            (::std::string::String::from($name), $crate::FieldDecl::from($decl))
        ),*]
    };
}
