//! Ingestion: raw data into instances
//!
//! `update`, `merge` and `attr` share one per-field procedure, `set_field`:
//!
//! 1. skip absent/null values when `skip_null` is on (direct calls)
//! 2. run the type-check policy when debug or strict is on
//! 3. ignore getter-only accessors
//! 4. a parse hook's result is stored verbatim
//! 5. absent values fall back to the default when there is one, the field is
//!    optional, or coercion on parse is off
//! 6. otherwise coerce by model: primitives through the coercion table,
//!    sequences element-wise, nested schemas by recursive ingestion

use super::structural::clone_within;
use super::{Schema, Traversal};
use crate::coerce::coerce;
use crate::error::Result;
use crate::field::{Element, Field, FieldContext, Model};
use crate::instance::Instance;
use crate::options::{HandleOptions, Handler};
use crate::value::{is_nullish, Value};

impl Schema {
    /// Build a new instance from raw (source-shaped) data
    pub fn parse(&self, data: impl Into<Value>) -> Result<Instance> {
        self.parse_with(data, HandleOptions::default())
    }

    /// Build an instance with every field at its default or empty value
    pub fn empty(&self) -> Result<Instance> {
        self.parse(Value::object())
    }

    pub fn parse_with(&self, data: impl Into<Value>, options: HandleOptions) -> Result<Instance> {
        let handler = options.handler.unwrap_or_else(|| self.default_handler());
        let options = HandleOptions {
            skip_null: Some(options.skip_null.unwrap_or(false)),
            ..options
        };
        self.parse_in(data.into(), handler, &options, &mut Traversal::new())
    }

    pub fn parse_list<I, V>(&self, list: I) -> Result<Vec<Instance>>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        list.into_iter().map(|item| self.parse(item)).collect()
    }

    /// Build a new instance from logical-shaped data
    pub fn init(&self, data: impl Into<Value>) -> Result<Instance> {
        self.parse_with(data, HandleOptions::new().handler(Handler::Merge))
    }

    pub fn init_with(&self, data: impl Into<Value>, options: HandleOptions) -> Result<Instance> {
        self.parse_with(data, options.handler(Handler::Merge))
    }

    /// Ingest source-keyed data into an existing instance
    pub fn update(&self, target: &Instance, data: impl Into<Value>) -> Result<Instance> {
        self.handle(Handler::Update, target, data.into(), HandleOptions::default())
    }

    pub fn update_with(&self, target: &Instance, data: impl Into<Value>, options: HandleOptions) -> Result<Instance> {
        self.handle(Handler::Update, target, data.into(), options)
    }

    /// Ingest logical-keyed data into an existing instance
    pub fn merge(&self, target: &Instance, data: impl Into<Value>) -> Result<Instance> {
        self.handle(Handler::Merge, target, data.into(), HandleOptions::default())
    }

    pub fn merge_with(&self, target: &Instance, data: impl Into<Value>, options: HandleOptions) -> Result<Instance> {
        self.handle(Handler::Merge, target, data.into(), options)
    }

    /// Copy every key of `data` onto the instance, declared or not
    pub fn attr(&self, target: &Instance, data: impl Into<Value>) -> Result<Instance> {
        self.handle(Handler::Attr, target, data.into(), HandleOptions::default())
    }

    pub fn attr_with(&self, target: &Instance, data: impl Into<Value>, options: HandleOptions) -> Result<Instance> {
        self.handle(Handler::Attr, target, data.into(), options)
    }

    fn handle(&self, handler: Handler, target: &Instance, data: Value, options: HandleOptions) -> Result<Instance> {
        let options = HandleOptions {
            skip_null: Some(options.skip_null.unwrap_or(true)),
            ..options
        };
        self.ingest(handler, target, data, &options, &mut Traversal::new())?;
        Ok(target.clone())
    }

    /// Ingest a single logical field
    pub fn set_field(
        &self,
        target: &Instance,
        field: &str,
        value: Option<Value>,
        options: HandleOptions,
    ) -> Result<()> {
        let handler = options.handler.unwrap_or_else(|| self.default_handler());
        let options = HandleOptions {
            skip_null: Some(options.skip_null.unwrap_or(true)),
            ..options
        };
        let data = Value::object();
        self.set_field_in(target, field, value, &data, None, handler, &options, &mut Traversal::new())
    }

    pub(super) fn parse_in(
        &self,
        data: Value,
        handler: Handler,
        options: &HandleOptions,
        traversal: &mut Traversal,
    ) -> Result<Instance> {
        traversal.enter(self)?;
        let target = Instance::new(self.clone());
        let result = self.ingest(handler, &target, data, options, traversal);
        traversal.leave();
        result.map(|_| target)
    }

    pub(super) fn ingest(
        &self,
        handler: Handler,
        target: &Instance,
        data: Value,
        options: &HandleOptions,
        traversal: &mut Traversal,
    ) -> Result<()> {
        match handler {
            Handler::Update => {
                let data = match &self.options().on_before_update {
                    Some(hook) => hook(target, data),
                    None => data,
                };
                let data = if data.is_truthy() { data } else { Value::object() };
                for (name, field) in self.fields().iter() {
                    let value = field.key.as_deref().and_then(|key| data.field(key));
                    self.set_field_in(target, name, value, &data, Some(field), handler, options, traversal)?;
                }
                self.notify_change(target, Some(&data));
            }
            Handler::Merge => {
                if !data.is_truthy() {
                    return Ok(());
                }
                for (name, field) in self.fields().iter() {
                    let value = data.field(name);
                    self.set_field_in(target, name, value, &data, Some(field), handler, options, traversal)?;
                }
                self.notify_change(target, Some(&data));
            }
            Handler::Attr => {
                if !data.is_truthy() {
                    return Ok(());
                }
                for key in data.keys() {
                    let value = data.field(&key);
                    self.set_field_in(target, &key, value, &data, None, handler, options, traversal)?;
                }
                self.notify_change(target, Some(&data));
            }
        }
        Ok(())
    }

    pub(super) fn notify_change(&self, target: &Instance, data: Option<&Value>) {
        if let Some(hook) = &self.options().on_data_change {
            hook(target, data);
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub(super) fn set_field_in(
        &self,
        target: &Instance,
        name: &str,
        value: Option<Value>,
        data: &Value,
        descriptor: Option<&Field>,
        handler: Handler,
        options: &HandleOptions,
        traversal: &mut Traversal,
    ) -> Result<()> {
        if options.skip_null.unwrap_or(true) && is_nullish(value.as_ref()) {
            return Ok(());
        }

        let fallback;
        let descriptor = match descriptor.or_else(|| self.field(name)) {
            Some(descriptor) => descriptor,
            None => {
                fallback = Field::default();
                &fallback
            }
        };

        if let Some(model) = &descriptor.model {
            self.policy(options).enforce(name, model, value.as_ref())?;
        }

        if descriptor.is_readonly_accessor() {
            return Ok(());
        }

        let ctx = FieldContext {
            target,
            field: name,
            data,
            descriptor,
        };

        if let Some(parse) = &descriptor.parse {
            let parsed = parse(&ctx, value.as_ref())?;
            return target.store(name, parsed);
        }

        if is_nullish(value.as_ref())
            && (descriptor.has_default() || descriptor.optional || !self.parse_to_model(options))
        {
            let resolved = descriptor.resolve_default(&ctx).or(value);
            return target.store(name, resolved);
        }

        let resolved = self.resolve_value(target, name, value, descriptor, handler, options, traversal)?;
        target.store(name, resolved)
    }

    #[allow(clippy::too_many_arguments)]
    fn resolve_value(
        &self,
        target: &Instance,
        name: &str,
        value: Option<Value>,
        descriptor: &Field,
        handler: Handler,
        options: &HandleOptions,
        traversal: &mut Traversal,
    ) -> Result<Option<Value>> {
        let Some(model) = &descriptor.model else {
            return match value {
                Some(Value::Instance(instance)) if traversal.cloning => {
                    Ok(Some(Value::Instance(clone_within(&instance, true, traversal)?)))
                }
                other => Ok(other),
            };
        };

        match model {
            Model::Primitive(kind) => Ok(Some(coerce(*kind, value.as_ref()))),
            Model::SequenceOf(element) => {
                self.resolve_list(value, element, handler, options, traversal).map(Some)
            }
            Model::Nested(schema_ref) => {
                if matches!(value, Some(Value::Array(_))) {
                    let element = Element::Nested(schema_ref.clone());
                    return self
                        .resolve_list(value, &element, handler, options, traversal)
                        .map(Some);
                }
                if let Some(Value::Instance(incoming)) = &value {
                    return Ok(Some(Value::Instance(clone_within(incoming, true, traversal)?)));
                }

                let nested = schema_ref.resolve()?;
                if let Some(Value::Instance(existing)) = target.stored(name) {
                    if existing.schema().id() == nested.id() {
                        traversal.enter(&nested)?;
                        let result = nested.ingest(handler, &existing, value.unwrap_or_default(), options, traversal);
                        traversal.leave();
                        result?;
                        return Ok(Some(Value::Instance(existing)));
                    }
                }

                let nested_options = HandleOptions {
                    skip_null: Some(false),
                    ..*options
                };
                let instance = nested.parse_in(value.unwrap_or_default(), handler, &nested_options, traversal)?;
                Ok(Some(Value::Instance(instance)))
            }
        }
    }

    fn resolve_list(
        &self,
        value: Option<Value>,
        element: &Element,
        handler: Handler,
        options: &HandleOptions,
        traversal: &mut Traversal,
    ) -> Result<Value> {
        let items = match value {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(other) => vec![other],
        };

        let resolved = match element {
            Element::Primitive(kind) => items.iter().map(|item| coerce(*kind, Some(item))).collect(),
            Element::Nested(schema_ref) => {
                let nested = schema_ref.resolve()?;
                let nested_options = HandleOptions {
                    skip_null: Some(false),
                    ..*options
                };
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::Instance(incoming) => {
                            clone_within(&incoming, true, traversal).map(Value::Instance)
                        }
                        raw => nested
                            .parse_in(raw, handler, &nested_options, traversal)
                            .map(Value::Instance),
                    })
                    .collect::<Result<Vec<_>>>()?
            }
        };
        Ok(Value::Array(resolved))
    }
}
