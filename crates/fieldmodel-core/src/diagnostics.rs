//! Type-check policy for ingestion
//!
//! Evaluates how the diagnostic level (Silent/Warn/Strict) responds to a value
//! that does not fit its field's declared model. The policy only decides; the
//! schema runtime applies the decision before coercing the value.
//!
//! Copyright (c) 2025 Fieldmodel Team
//! Licensed under the Apache-2.0 license

use crate::coerce::check_type;
use crate::error::{Diagnostics, Error, Result};
use crate::field::Model;
use crate::value::Value;

/// Action to take after checking a value against its model
#[derive(Debug)]
pub enum CheckAction {
    /// Value fits, or checks are off
    Proceed,
    /// Log a warning and keep coercing
    Warn { message: String },
    /// Abort the ingestion call
    Fail { error: Error },
}

/// Type-check policy bound to one diagnostic level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeCheckPolicy {
    level: Diagnostics,
}

impl TypeCheckPolicy {
    pub fn new(level: Diagnostics) -> Self {
        Self { level }
    }

    pub fn level(&self) -> Diagnostics {
        self.level
    }

    /// Check `value` against `model` for the field `field`
    pub fn evaluate(&self, field: &str, model: &Model, value: Option<&Value>) -> CheckAction {
        if self.level == Diagnostics::Silent || check_type(model, value) {
            return CheckAction::Proceed;
        }

        let actual = value.map_or("Undefined", Value::kind_name);
        let error = Error::TypeMismatch {
            field: field.to_string(),
            expected: model.type_name(),
            actual: actual.to_string(),
        };

        match self.level {
            Diagnostics::Strict => CheckAction::Fail { error },
            _ => CheckAction::Warn {
                message: error.to_string(),
            },
        }
    }

    /// Evaluate and apply: warnings go to the log, failures are returned
    pub fn enforce(&self, field: &str, model: &Model, value: Option<&Value>) -> Result<()> {
        match self.evaluate(field, model, value) {
            CheckAction::Proceed => Ok(()),
            CheckAction::Warn { message } => {
                log::warn!("{}", message);
                Ok(())
            }
            CheckAction::Fail { error } => Err(error),
        }
    }
}
