//! Structural operations: clear, clone, pick/omit and composition

use super::{Schema, Traversal};
use crate::compose::{compose, Composition};
use crate::error::Result;
use crate::field::Field;
use crate::instance::Instance;
use crate::normalize::{normalize, FieldDecl};
use crate::options::{HandleOptions, Handler, SchemaOptions};
use crate::value::{RawRecord, Record, Value};
use std::sync::Arc;

impl Schema {
    /// Reset fields of an instance
    ///
    /// `all_keys` resets every enumerable key instead of only declared fields.
    /// `reinitialize` restores defaults and typed empty values instead of
    /// removing the values. Getter-only accessors are left alone.
    pub fn clear(&self, target: &Instance, all_keys: bool, reinitialize: bool) -> Result<Instance> {
        let keys: Vec<String> = if all_keys {
            target.keys()
        } else {
            self.fields().keys().map(str::to_string).collect()
        };
        let handler = self.default_handler();
        let options = HandleOptions::new().skip_null(false);
        let data = Value::object();
        let mut traversal = Traversal::new();

        for key in keys {
            if target
                .schema()
                .field(&key)
                .is_some_and(Field::is_readonly_accessor)
            {
                continue;
            }
            if reinitialize {
                self.set_field_in(target, &key, None, &data, None, handler, &options, &mut traversal)?;
            } else {
                target.store(&key, None)?;
            }
        }
        self.notify_change(target, None);
        Ok(target.clone())
    }

    /// Cycle-safe structural copy
    ///
    /// Nested instances are cloned too. An instance reached twice during one
    /// call is cloned once, so cyclic graphs produce a mirrored cyclic graph.
    /// `all_keys` copies ad hoc keys as well as declared fields.
    pub fn clone_instance(&self, target: &Instance, all_keys: bool) -> Result<Instance> {
        clone_within(target, all_keys, &mut Traversal::for_clone())
    }

    /// Logical-shaped projection of the listed fields
    pub fn pick(&self, target: &Instance, keys: &[&str]) -> Record {
        keys.iter()
            .filter_map(|key| target.get(key).map(|value| (key.to_string(), value)))
            .collect()
    }

    /// Source-shaped projection of the listed fields
    pub fn pick_raw(&self, target: &Instance, keys: &[&str]) -> Result<RawRecord> {
        let fallback = Field::default();
        let mut raw = RawRecord::new();
        for key in keys {
            let descriptor = self.field(key).unwrap_or(&fallback);
            if let Some(value) = self.convert_field(target, key, None, descriptor, &mut vec![target.id()])? {
                raw.insert(descriptor.source_key(key).to_string(), value);
            }
        }
        Ok(raw)
    }

    /// Logical-shaped projection of every declared field except the listed ones
    pub fn omit(&self, target: &Instance, keys: &[&str]) -> Record {
        self.omitted_fields(keys)
            .filter_map(|(name, _)| target.get(name).map(|value| (name.to_string(), value)))
            .collect()
    }

    /// Source-shaped projection of every declared field except the listed ones
    pub fn omit_raw(&self, target: &Instance, keys: &[&str]) -> Result<RawRecord> {
        let mut raw = RawRecord::new();
        for (name, field) in self.omitted_fields(keys) {
            if let Some(value) = self.convert_field(target, name, None, field, &mut vec![target.id()])? {
                raw.insert(field.source_key(name).to_string(), value);
            }
        }
        Ok(raw)
    }

    fn omitted_fields<'a>(&'a self, keys: &'a [&str]) -> impl Iterator<Item = (&'a str, &'a Field)> {
        self.fields()
            .iter()
            .filter(move |(name, field)| {
                !keys.contains(name) && !(field.has_getter() && field.key.is_none())
            })
    }

    /// New schema with every field of this one plus `fields`
    pub fn extends<I, K, D>(&self, fields: I, options: SchemaOptions) -> Schema
    where
        I: IntoIterator<Item = (K, D)>,
        K: Into<String>,
        D: Into<FieldDecl>,
    {
        self.compose_with(Composition::Extend, fields, options)
    }

    /// New schema with the listed fields of this one plus `fields`
    pub fn pick_extends<I, K, D>(&self, keys: &[&str], fields: I, options: SchemaOptions) -> Schema
    where
        I: IntoIterator<Item = (K, D)>,
        K: Into<String>,
        D: Into<FieldDecl>,
    {
        self.compose_with(Composition::pick(keys.iter().copied()), fields, options)
    }

    /// New schema without the listed fields of this one, plus `fields`
    pub fn omit_extends<I, K, D>(&self, keys: &[&str], fields: I, options: SchemaOptions) -> Schema
    where
        I: IntoIterator<Item = (K, D)>,
        K: Into<String>,
        D: Into<FieldDecl>,
    {
        self.compose_with(Composition::omit(keys.iter().copied()), fields, options)
    }

    /// Derive a schema; options are layered as `{ ...base, ...options }`
    pub fn compose_with<I, K, D>(&self, composition: Composition, fields: I, options: SchemaOptions) -> Schema
    where
        I: IntoIterator<Item = (K, D)>,
        K: Into<String>,
        D: Into<FieldDecl>,
    {
        let table = compose(self.fields(), &composition, normalize(fields));
        let options = self.options().merged_with(&options);
        tracing::debug!(
            base = %self.name(),
            composition = ?composition,
            fields = table.len(),
            "derived schema"
        );
        Schema::from_table(Arc::clone(self.config()), table, options)
    }
}

/// Clone `target` with its own schema, sharing the traversal's visited map
///
/// Instances held by model-less fields are cloned as well while this runs,
/// whichever operation started it.
pub(super) fn clone_within(target: &Instance, all_keys: bool, traversal: &mut Traversal) -> Result<Instance> {
    let was_cloning = std::mem::replace(&mut traversal.cloning, true);
    let result = clone_visiting(target, all_keys, traversal);
    traversal.cloning = was_cloning;
    result
}

fn clone_visiting(target: &Instance, all_keys: bool, traversal: &mut Traversal) -> Result<Instance> {
    let schema = target.schema().clone();
    let visit_key = (schema.id(), target.id());
    if let Some(existing) = traversal.visited.get(&visit_key) {
        return Ok(existing.clone());
    }

    let options = HandleOptions::new().skip_null(false);
    let copy = schema.parse_in(Value::object(), schema.default_handler(), &options, traversal)?;
    traversal.visited.insert(visit_key, copy.clone());

    let handler = if all_keys { Handler::Attr } else { Handler::Merge };
    traversal.enter(&schema)?;
    let result = schema.ingest(handler, &copy, Value::Instance(target.clone()), &options, traversal);
    traversal.leave();
    result?;
    Ok(copy)
}
