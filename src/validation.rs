//! Pre-flight parameter validation.
//!
//! Values are checked against a model's [`ParameterDef`]s before anything is
//! sent to the network. Checks are exact: no string-to-number coercion, no
//! truthy booleans, select values must equal an option value.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::types::{ParameterDef, ParameterKind, ParameterValues};
use crate::{ReelgateError, Result};

/// A single failed parameter check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterError {
    /// Name of the offending parameter.
    pub parameter: String,
    /// Human-readable message, always naming the parameter.
    pub message: String,
}

impl ParameterError {
    fn new(def: &ParameterDef, reason: impl fmt::Display) -> Self {
        Self {
            parameter: def.name.clone(),
            message: format!("{} {}", def.name, reason),
        }
    }
}

impl fmt::Display for ParameterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Validate one value against its definition.
///
/// `None` means the parameter was not supplied at all; `Some(Value::Null)`
/// means it was supplied as null. Both are treated alike.
pub fn validate_parameter(
    value: Option<&Value>,
    def: &ParameterDef,
) -> std::result::Result<(), ParameterError> {
    let value = match value {
        None | Some(Value::Null) if def.required => {
            return Err(ParameterError::new(def, "is required"));
        }
        Some(Value::String(s)) if def.required && s.is_empty() => {
            return Err(ParameterError::new(def, "is required"));
        }
        None | Some(Value::Null) => return Ok(()),
        Some(value) => value,
    };

    match def.kind {
        ParameterKind::String => {
            let Value::String(s) = value else {
                return Err(ParameterError::new(def, "must be a string"));
            };
            if def.required && s.trim().is_empty() {
                return Err(ParameterError::new(def, "cannot be empty"));
            }
        }
        ParameterKind::Number => {
            let Some(n) = value.as_f64().filter(|n| n.is_finite()) else {
                return Err(ParameterError::new(def, "must be a number"));
            };
            if let Some(min) = def.min
                && n < min
            {
                return Err(ParameterError::new(
                    def,
                    format_args!("must be at least {}", Bound(min)),
                ));
            }
            if let Some(max) = def.max
                && n > max
            {
                return Err(ParameterError::new(
                    def,
                    format_args!("must be at most {}", Bound(max)),
                ));
            }
        }
        ParameterKind::Boolean => {
            if !value.is_boolean() {
                return Err(ParameterError::new(def, "must be a boolean"));
            }
        }
        ParameterKind::Select => {
            if def.options.is_empty() {
                return Err(ParameterError::new(def, "has no valid options"));
            }
            if !def.has_option(value) {
                let allowed = def
                    .option_values()
                    .map(display_value)
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(ParameterError::new(
                    def,
                    format_args!("must be one of: {allowed}"),
                ));
            }
        }
    }

    Ok(())
}

/// Outcome of validating a full parameter set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// One entry per invalid parameter, in definition order.
    pub errors: Vec<ParameterError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Error message for `parameter`, if it failed.
    pub fn error_for(&self, parameter: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.parameter == parameter)
            .map(|e| e.message.as_str())
    }

    /// Convert into a `Result`, failing with [`ReelgateError::Validation`].
    pub fn into_result(self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ReelgateError::Validation(self.errors))
        }
    }
}

/// Validate every declared parameter. Keys not declared in `defs` are ignored.
pub fn validate_all(values: &ParameterValues, defs: &[ParameterDef]) -> ValidationReport {
    let errors = defs
        .iter()
        .filter_map(|def| validate_parameter(values.get(&def.name), def).err())
        .collect();
    ValidationReport { errors }
}

/// Fill keys missing from `values` with their non-null declared defaults.
pub fn apply_defaults(values: &mut ParameterValues, defs: &[ParameterDef]) {
    for def in defs {
        if values.contains_key(&def.name) {
            continue;
        }
        if let Some(default) = def.default_if_set() {
            values.insert(def.name.clone(), default.clone());
        }
    }
}

/// Strings render without quotes in messages.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Renders whole-number bounds without a fractional part.
struct Bound(f64);

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 && self.0.abs() < 1e15 {
            write!(f, "{}", self.0 as i64)
        } else {
            write!(f, "{}", self.0)
        }
    }
}
