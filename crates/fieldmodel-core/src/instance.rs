//! Parsed instances
//!
//! An [`Instance`] pairs a data record with the [`Schema`] that produced it.
//! Instances are shared handles: cloning the handle does not copy the data,
//! and nested schema fields hold handles to sub-instances, so instance graphs
//! may be cyclic. A cyclic graph is only reclaimed once the cycle is broken
//! (for example with [`Instance::unset`] or `Schema::clear`).
//!
//! Accessor fields are resolved through the schema on every read and write;
//! no interior borrow is held while a getter, setter or hook runs.

use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::value::{Record, Value};
use serde_json::Value as JsonValue;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of an instance handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
    fn next() -> Self {
        InstanceId(NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

struct InstanceInner {
    id: InstanceId,
    schema: Schema,
    data: RefCell<Record>,
}

/// A parsed record and its owning schema
#[derive(Clone)]
pub struct Instance(Rc<InstanceInner>);

impl Instance {
    pub(crate) fn new(schema: Schema) -> Self {
        Self::from_record(schema, Record::new())
    }

    pub(crate) fn from_record(schema: Schema, record: Record) -> Self {
        Instance(Rc::new(InstanceInner {
            id: InstanceId::next(),
            schema,
            data: RefCell::new(record),
        }))
    }

    pub fn id(&self) -> InstanceId {
        self.0.id
    }

    pub fn schema(&self) -> &Schema {
        &self.0.schema
    }

    /// Whether both handles point at the same instance
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Read a field; getter accessors are computed on read
    pub fn get(&self, field: &str) -> Option<Value> {
        if let Some(getter) = self.schema().field(field).and_then(|f| f.getter_fn()) {
            return Some(getter(self));
        }
        self.stored(field)
    }

    /// Read the stored value, bypassing accessors
    pub(crate) fn stored(&self, field: &str) -> Option<Value> {
        self.0.data.borrow().get(field).cloned()
    }

    /// Write a field from application code
    ///
    /// Setter accessors run; getter-only accessors and `readonly` fields are
    /// rejected.
    pub fn set(&self, field: &str, value: impl Into<Value>) -> Result<()> {
        if let Some(descriptor) = self.schema().field(field) {
            if descriptor.readonly || descriptor.is_readonly_accessor() {
                return Err(Error::ReadonlyField {
                    field: field.to_string(),
                });
            }
        }
        self.store(field, Some(value.into()))
    }

    /// Remove a stored field
    pub fn unset(&self, field: &str) -> Result<()> {
        if self
            .schema()
            .field(field)
            .is_some_and(|descriptor| descriptor.is_readonly_accessor())
        {
            return Err(Error::ReadonlyField {
                field: field.to_string(),
            });
        }
        self.store(field, None)
    }

    /// Write used by ingestion: setters run, getter-only accessors are ignored,
    /// `None` removes the stored value.
    pub(crate) fn store(&self, field: &str, value: Option<Value>) -> Result<()> {
        let setter = match self.schema().field(field) {
            Some(descriptor) if descriptor.is_readonly_accessor() => return Ok(()),
            Some(descriptor) => descriptor.setter_fn().cloned(),
            None => None,
        };
        if let Some(setter) = setter {
            return setter(self, value.unwrap_or_default());
        }

        let mut data = self.0.data.borrow_mut();
        match value {
            Some(value) => {
                data.insert(field.to_string(), value);
            }
            None => {
                data.shift_remove(field);
            }
        }
        Ok(())
    }

    /// Whether the field is stored or is an accessor of the schema
    pub fn contains_key(&self, field: &str) -> bool {
        self.0.data.borrow().contains_key(field)
            || self.schema().field(field).is_some_and(|f| f.has_getter())
    }

    /// Enumerable keys: declared fields in declaration order, then ad hoc keys
    pub fn keys(&self) -> Vec<String> {
        let data = self.0.data.borrow();
        let fields = self.schema().fields();
        let mut keys: Vec<String> = fields
            .iter()
            .filter(|(name, field)| {
                if field.has_getter() {
                    field.is_enumerable()
                } else {
                    data.contains_key(*name)
                }
            })
            .map(|(name, _)| name.to_string())
            .collect();
        keys.extend(
            data.keys()
                .filter(|key| !fields.contains(key))
                .cloned(),
        );
        keys
    }

    /// Copy of every enumerable field, accessors computed
    pub fn snapshot(&self) -> Record {
        self.keys()
            .into_iter()
            .filter_map(|key| self.get(&key).map(|value| (key, value)))
            .collect()
    }

    /// Logical-shaped JSON. Cyclic references render as `null`.
    pub fn to_json(&self) -> JsonValue {
        self.to_json_guarded(&mut Vec::new())
    }

    pub(crate) fn to_json_guarded(&self, stack: &mut Vec<InstanceId>) -> JsonValue {
        if stack.contains(&self.id()) {
            return JsonValue::Null;
        }
        stack.push(self.id());
        let map = self
            .keys()
            .into_iter()
            .filter_map(|key| {
                let value = self.get(&key)?;
                Some((key, value.to_json_guarded(stack)))
            })
            .collect();
        stack.pop();
        JsonValue::Object(map)
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys = self.0.data.try_borrow().map(|data| data.keys().cloned().collect::<Vec<_>>());
        f.debug_struct("Instance")
            .field("id", &self.id().as_u64())
            .field("schema", &self.schema().name())
            .field("stored", &keys.unwrap_or_default())
            .finish()
    }
}
