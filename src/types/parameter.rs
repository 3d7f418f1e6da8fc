//! Parameter schema types for catalog models.
//!
//! A [`ParameterDef`] describes one input a video model accepts: its kind,
//! whether it is required, its default and its constraints. The validator
//! in [`crate::validation`] checks user values against these definitions.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// User-supplied parameter values, keyed by parameter name.
pub type ParameterValues = serde_json::Map<String, Value>;

/// Declared type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    String,
    Number,
    Boolean,
    /// One of a fixed list of option values.
    Select,
}

impl ParameterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Select => "select",
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One allowed value of a `select` parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    /// Option value sent upstream (string or number).
    pub value: Value,
    /// Human-readable label.
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<Value>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Definition of a single model parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDef {
    /// Parameter name, unique within a model (matches the upstream input name).
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    #[serde(default)]
    pub description: String,
    /// Default value if the user provides none.
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub required: bool,
    /// Minimum allowed value (inclusive, number parameters).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Maximum allowed value (inclusive, number parameters).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Allowed values (select parameters).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
}

impl ParameterDef {
    fn with_kind(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: String::new(),
            default: None,
            required: false,
            min: None,
            max: None,
            options: Vec::new(),
        }
    }

    /// Create a string parameter.
    pub fn string(name: impl Into<String>) -> Self {
        Self::with_kind(name, ParameterKind::String)
    }

    /// Create a number parameter.
    pub fn number(name: impl Into<String>) -> Self {
        Self::with_kind(name, ParameterKind::Number)
    }

    /// Create a boolean parameter.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::with_kind(name, ParameterKind::Boolean)
    }

    /// Create a select parameter with its allowed options.
    pub fn select(name: impl Into<String>, options: Vec<SelectOption>) -> Self {
        Self {
            options,
            ..Self::with_kind(name, ParameterKind::Select)
        }
    }

    /// Mark the parameter as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the default value.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Set the minimum value (inclusive).
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Set the maximum value (inclusive).
    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Option values of a select parameter, in declaration order.
    pub fn option_values(&self) -> impl Iterator<Item = &Value> {
        self.options.iter().map(|opt| &opt.value)
    }

    /// Whether `value` is one of the select options. Numbers compare by
    /// value, so `5` matches an option of `5.0`.
    pub fn has_option(&self, value: &Value) -> bool {
        self.option_values().any(|opt| same_value(opt, value))
    }

    /// The non-null default, if any.
    pub fn default_if_set(&self) -> Option<&Value> {
        self.default.as_ref().filter(|v| !v.is_null())
    }

    /// Check the definition's own invariants.
    ///
    /// A select parameter must declare at least one option, and a non-null
    /// default must be one of them.
    pub fn check(&self) -> std::result::Result<(), String> {
        if self.kind != ParameterKind::Select {
            return Ok(());
        }
        if self.options.is_empty() {
            return Err(format!("select parameter '{}' has no options", self.name));
        }
        if let Some(default) = self.default_if_set() {
            if !self.has_option(default) {
                return Err(format!(
                    "default of select parameter '{}' is not one of its options",
                    self.name
                ));
            }
        }
        Ok(())
    }
}

/// Strict equality; `5` and `5.0` are the same number, `"5"` and `5` are not.
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}
