//! Schema runtime
//!
//! A [`Schema`] owns a normalized field table, its options and the engine
//! configuration it was defined with. It is immutable after construction:
//! composition methods (`extends`, `pick_extends`, `omit_extends`) build new
//! schemas and never patch an existing one, so one schema can be shared by
//! many derived schemas and instances.
//!
//! The runtime is split by direction:
//! - `ingest`: `parse`, `init`, `update`, `merge`, `attr` and per-field `set_field`
//! - `extract`: `convert` and its aliases
//! - `structural`: `clear`, `clone`, `pick`/`omit` and composition
//!
//! # Examples
//!
//! ```
//! use fieldmodel_core::{fields, Field, Model, Primitive, Schema, SchemaOptions};
//! use serde_json::json;
//!
//! let user = Schema::define(
//!     fields! {
//!         "id" => "user_id",
//!         "name" => Field::keyed("user_name").default_value(""),
//!         "tags" => Field::keyed("user_tags").model(Model::sequence_of(Primitive::Text)),
//!     },
//!     SchemaOptions::default(),
//! );
//!
//! let instance = user.parse(json!({"user_id": 1})).unwrap();
//! assert_eq!(instance.to_json(), json!({"id": 1, "name": "", "tags": []}));
//! assert_eq!(
//!     serde_json::Value::Object(user.convert(&instance).unwrap()),
//!     json!({"user_id": 1, "user_name": "", "user_tags": []})
//! );
//! ```

mod extract;
mod ingest;
mod structural;

use crate::config::EngineConfig;
use crate::diagnostics::TypeCheckPolicy;
use crate::enums::EnumLookup;
use crate::error::{Diagnostics, Error, Result};
use crate::field::Field;
use crate::instance::{Instance, InstanceId};
use crate::normalize::{normalize, FieldDecl, FieldTable};
use crate::options::{HandleOptions, Handler, SchemaOptions};
use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Recursion guard for nested schema ingestion
pub const MAX_NESTING_DEPTH: usize = 128;

static NEXT_SCHEMA_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity assigned at schema construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(u64);

impl SchemaId {
    fn next() -> Self {
        SchemaId(NEXT_SCHEMA_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

pub(crate) struct SchemaInner {
    id: SchemaId,
    fields: FieldTable,
    options: SchemaOptions,
    config: Arc<EngineConfig>,
    enum_cache: RefCell<HashMap<String, Arc<dyn EnumLookup>>>,
}

/// Shared handle to an immutable schema
#[derive(Clone)]
pub struct Schema(Rc<SchemaInner>);

impl Schema {
    /// Define a schema using the process-wide engine config
    pub fn define<I, K, D>(fields: I, options: SchemaOptions) -> Schema
    where
        I: IntoIterator<Item = (K, D)>,
        K: Into<String>,
        D: Into<FieldDecl>,
    {
        Self::define_in(EngineConfig::global(), fields, options)
    }

    /// Define a schema with an explicit engine config
    pub fn define_in<I, K, D>(config: Arc<EngineConfig>, fields: I, options: SchemaOptions) -> Schema
    where
        I: IntoIterator<Item = (K, D)>,
        K: Into<String>,
        D: Into<FieldDecl>,
    {
        Self::from_table(config, normalize(fields), options)
    }

    pub(crate) fn from_table(config: Arc<EngineConfig>, fields: FieldTable, options: SchemaOptions) -> Schema {
        Schema(Rc::new(SchemaInner {
            id: SchemaId::next(),
            fields,
            options,
            config,
            enum_cache: RefCell::new(HashMap::new()),
        }))
    }

    pub fn id(&self) -> SchemaId {
        self.0.id
    }

    /// Declared name, or `Model` for anonymous schemas
    pub fn name(&self) -> String {
        self.0
            .options
            .name
            .clone()
            .unwrap_or_else(|| "Model".to_string())
    }

    pub fn fields(&self) -> &FieldTable {
        &self.0.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.0.fields.get(name)
    }

    pub fn options(&self) -> &SchemaOptions {
        &self.0.options
    }

    pub fn config(&self) -> &Arc<EngineConfig> {
        &self.0.config
    }

    pub fn ptr_eq(&self, other: &Schema) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Weak handle for deferred references
    pub fn downgrade(&self) -> WeakSchema {
        WeakSchema(Rc::downgrade(&self.0))
    }

    pub(crate) fn default_handler(&self) -> Handler {
        self.0.options.handler.unwrap_or_default()
    }

    pub(crate) fn parse_to_model(&self, options: &HandleOptions) -> bool {
        options
            .parse_to_model
            .or(self.0.options.parse_to_model)
            .unwrap_or(true)
    }

    pub(crate) fn convert_to_model(&self) -> bool {
        self.0.options.convert_to_model.unwrap_or(false)
    }

    /// Diagnostic level: per-call, then per-schema, then engine config
    pub fn diagnostics(&self, options: &HandleOptions) -> Diagnostics {
        let debug = options
            .debug
            .or(self.0.options.debug)
            .unwrap_or(self.0.config.debug);
        let strict = options
            .strict
            .or(self.0.options.strict)
            .unwrap_or(self.0.config.strict);
        Diagnostics::from_flags(debug, strict)
    }

    pub(crate) fn policy(&self, options: &HandleOptions) -> TypeCheckPolicy {
        TypeCheckPolicy::new(self.diagnostics(options))
    }

    /// Label lookup for a field's enum spec, built once per field and cached
    ///
    /// Returns `Ok(None)` for a field without an enum spec and a configuration
    /// error when the engine config has no enum factory.
    pub fn enumeration(&self, field: &str) -> Result<Option<Arc<dyn EnumLookup>>> {
        if let Some(cached) = self.0.enum_cache.borrow().get(field) {
            return Ok(Some(Arc::clone(cached)));
        }
        let Some(spec) = self.field(field).and_then(|f| f.enumeration.as_ref()) else {
            return Ok(None);
        };
        let factory = self.0.config.enum_factory.as_ref().ok_or_else(|| {
            Error::configuration(
                "enum factory not registered; install one with EngineConfig::with_enum_factory",
            )
        })?;
        let lookup = factory.build(spec)?;
        self.0
            .enum_cache
            .borrow_mut()
            .insert(field.to_string(), Arc::clone(&lookup));
        Ok(Some(lookup))
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("id", &self.id().as_u64())
            .field("name", &self.name())
            .field("fields", &self.0.fields.keys().collect::<Vec<_>>())
            .field("options", &self.0.options)
            .finish()
    }
}

/// Non-owning schema handle
#[derive(Clone)]
pub struct WeakSchema(Weak<SchemaInner>);

impl WeakSchema {
    pub fn upgrade(&self) -> Option<Schema> {
        self.0.upgrade().map(Schema)
    }
}

/// Placeholder for a schema that is defined later
///
/// Self-referential and mutually recursive schemas reference each other
/// through slots. The slot holds a weak handle, so a schema referring to
/// itself does not keep itself alive.
///
/// ```
/// use fieldmodel_core::{fields, Field, Schema, SchemaOptions, SchemaSlot};
///
/// let slot = SchemaSlot::new("Node");
/// let node = Schema::define(
///     fields! {
///         "id" => "id",
///         "next" => Field::of(slot.reference()).optional(),
///     },
///     SchemaOptions::new().name("Node"),
/// );
/// slot.fill(&node).unwrap();
/// assert!(slot.reference().resolve().unwrap().ptr_eq(&node));
/// ```
#[derive(Clone)]
pub struct SchemaSlot {
    name: Rc<str>,
    cell: Rc<OnceCell<WeakSchema>>,
}

impl SchemaSlot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Rc::from(name.into()),
            cell: Rc::new(OnceCell::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Point the slot at its schema. A slot can be filled once.
    pub fn fill(&self, schema: &Schema) -> Result<()> {
        self.cell.set(schema.downgrade()).map_err(|_| {
            Error::configuration(format!("schema slot '{}' is already filled", self.name))
        })
    }

    pub fn is_filled(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn reference(&self) -> SchemaRef {
        SchemaRef::Deferred(self.clone())
    }
}

/// Reference from a field model to a nested schema
#[derive(Clone)]
pub enum SchemaRef {
    Strong(Schema),
    Deferred(SchemaSlot),
}

impl SchemaRef {
    pub fn resolve(&self) -> Result<Schema> {
        match self {
            SchemaRef::Strong(schema) => Ok(schema.clone()),
            SchemaRef::Deferred(slot) => slot
                .cell
                .get()
                .and_then(WeakSchema::upgrade)
                .ok_or_else(|| Error::UnresolvedSchema {
                    name: slot.name().to_string(),
                }),
        }
    }

    pub fn name(&self) -> String {
        match self {
            SchemaRef::Strong(schema) => schema.name(),
            SchemaRef::Deferred(slot) => slot.name().to_string(),
        }
    }
}

impl From<Schema> for SchemaRef {
    fn from(schema: Schema) -> Self {
        SchemaRef::Strong(schema)
    }
}

impl fmt::Debug for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaRef::Strong(schema) => write!(f, "Strong({})", schema.name()),
            SchemaRef::Deferred(slot) => write!(f, "Deferred({})", slot.name()),
        }
    }
}

/// Per-call traversal state: the clone visited map and the nesting depth
///
/// Created by every public entry point and dropped when it returns, so the
/// visited map never leaks across unrelated calls.
#[derive(Default)]
pub(crate) struct Traversal {
    visited: HashMap<(SchemaId, InstanceId), Instance>,
    /// Set while a `clone` is in progress
    cloning: bool,
    depth: usize,
}

impl Traversal {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn for_clone() -> Self {
        Self {
            cloning: true,
            ..Self::default()
        }
    }

    fn enter(&mut self, schema: &Schema) -> Result<()> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(Error::NestingTooDeep {
                schema: schema.name(),
                limit: MAX_NESTING_DEPTH,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}
