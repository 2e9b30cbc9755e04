//! Extraction: instances back into raw, source-keyed records

use super::{Schema, MAX_NESTING_DEPTH};
use crate::coerce::{coerce, is_empty_value};
use crate::error::{Error, Result};
use crate::field::{ConvertContext, ConvertRule, Field, Model};
use crate::instance::{Instance, InstanceId};
use crate::value::{RawRecord, Record, Value};
use serde_json::Value as JsonValue;

impl Schema {
    /// Convert an instance into its raw, source-keyed shape
    ///
    /// An instance already being converted further up the same path is a
    /// back-reference and comes out as `null`, as in [`Instance::to_json`].
    pub fn convert(&self, target: &Instance) -> Result<RawRecord> {
        self.convert_with(target, &Record::new())
    }

    /// Convert with logical-name overrides taking the place of stored values
    pub fn convert_with(&self, target: &Instance, overrides: &Record) -> Result<RawRecord> {
        self.convert_in(target, overrides, &mut Vec::new())
    }

    /// Alias of [`Schema::convert`]
    pub fn to_raw(&self, target: &Instance) -> Result<RawRecord> {
        self.convert(target)
    }

    /// Alias of [`Schema::convert`]
    pub fn to_dto(&self, target: &Instance) -> Result<RawRecord> {
        self.convert(target)
    }

    #[deprecated(note = "use `convert` or `to_raw`")]
    pub fn to_server(&self, target: &Instance) -> Result<RawRecord> {
        self.convert(target)
    }

    fn convert_in(&self, target: &Instance, overrides: &Record, path: &mut Vec<InstanceId>) -> Result<RawRecord> {
        if path.len() >= MAX_NESTING_DEPTH {
            return Err(Error::NestingTooDeep {
                schema: self.name(),
                limit: MAX_NESTING_DEPTH,
            });
        }
        path.push(target.id());
        let result = self.convert_fields(target, overrides, path);
        path.pop();
        result
    }

    fn convert_fields(&self, target: &Instance, overrides: &Record, path: &mut Vec<InstanceId>) -> Result<RawRecord> {
        let mut raw = RawRecord::new();
        for (name, field) in self.fields().iter() {
            if field.has_getter() && field.key.is_none() {
                continue;
            }
            let value_override = overrides.get(name).filter(|value| !value.is_null()).cloned();
            if let Some(value) = self.convert_field(target, name, value_override, field, path)? {
                raw.insert(field.source_key(name).to_string(), value);
            }
        }
        Ok(raw)
    }

    /// Raw value of one field, `None` when the field is omitted from output
    ///
    /// `path` holds the instances being converted above this field, `target`
    /// included.
    pub(super) fn convert_field(
        &self,
        target: &Instance,
        name: &str,
        value_override: Option<Value>,
        descriptor: &Field,
        path: &mut Vec<InstanceId>,
    ) -> Result<Option<JsonValue>> {
        let value = value_override.or_else(|| target.get(name));

        match &descriptor.convert {
            Some(ConvertRule::Skip) => return Ok(None),
            Some(ConvertRule::Hook(hook)) => {
                let ctx = ConvertContext {
                    target,
                    field: name,
                    descriptor,
                };
                return hook(&ctx, value.as_ref());
            }
            None => {}
        }

        let (kind, is_sequence) = descriptor
            .model
            .as_ref()
            .map_or((None, false), |model| (model.primitive(), model.is_sequence()));
        if descriptor.optional && is_empty_value(value.as_ref(), kind, is_sequence) {
            return Ok(None);
        }

        self.resolve_convert(value, descriptor.model.as_ref(), path)
    }

    fn resolve_convert(
        &self,
        value: Option<Value>,
        model: Option<&Model>,
        path: &mut Vec<InstanceId>,
    ) -> Result<Option<JsonValue>> {
        let Some(model) = model else {
            return Ok(value.map(|value| value.to_json_guarded(path)));
        };
        let nested = model.schema_ref().map(|schema| schema.resolve()).transpose()?;

        if !model.is_sequence() {
            return self.convert_item(value.as_ref(), model, nested.as_ref(), path);
        }

        let items = match value {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(other) => vec![other],
        };
        let mut raw = Vec::with_capacity(items.len());
        for item in &items {
            let converted = self.convert_item(Some(item), model, nested.as_ref(), path)?;
            raw.push(converted.unwrap_or(JsonValue::Null));
        }
        Ok(Some(JsonValue::Array(raw)))
    }

    fn convert_item(
        &self,
        item: Option<&Value>,
        model: &Model,
        nested: Option<&Schema>,
        path: &mut Vec<InstanceId>,
    ) -> Result<Option<JsonValue>> {
        if let (Some(item), Some(nested)) = (item, nested) {
            if item.is_truthy() {
                return nested
                    .convert_value(item, path)
                    .map(|raw| Some(raw.map_or(JsonValue::Null, JsonValue::Object)));
            }
        }
        match (self.convert_to_model(), model.primitive()) {
            (true, Some(kind)) => Ok(Some(coerce(kind, item).to_json())),
            _ => Ok(item.map(|item| item.to_json_guarded(path))),
        }
    }

    /// Convert any value through this schema: instances directly, plain
    /// objects through a transient instance. `None` for a back-reference.
    fn convert_value(&self, value: &Value, path: &mut Vec<InstanceId>) -> Result<Option<RawRecord>> {
        let transient;
        let target = match value {
            Value::Instance(instance) => {
                if path.contains(&instance.id()) {
                    return Ok(None);
                }
                instance
            }
            Value::Object(record) => {
                transient = Instance::from_record(self.clone(), record.clone());
                &transient
            }
            _ => {
                transient = Instance::new(self.clone());
                &transient
            }
        };
        self.convert_in(target, &Record::new(), path).map(Some)
    }
}
