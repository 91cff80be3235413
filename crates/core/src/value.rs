//! Typed flag values — the unit of data the decision service delivers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single modification value. Only booleans, numbers, and strings are
/// valid; the catalog parser drops anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Number(f64),
    String(String),
}

impl FlagValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FlagValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FlagValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FlagValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Variant name used in type-mismatch diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            FlagValue::Bool(_) => "bool",
            FlagValue::Number(_) => "number",
            FlagValue::String(_) => "string",
        }
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagValue::Bool(b) => write!(f, "{b}"),
            FlagValue::Number(n) => write!(f, "{n}"),
            FlagValue::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for FlagValue {
    fn from(v: bool) -> Self {
        FlagValue::Bool(v)
    }
}

impl From<f64> for FlagValue {
    fn from(v: f64) -> Self {
        FlagValue::Number(v)
    }
}

impl From<i64> for FlagValue {
    fn from(v: i64) -> Self {
        FlagValue::Number(v as f64)
    }
}

impl From<String> for FlagValue {
    fn from(v: String) -> Self {
        FlagValue::String(v)
    }
}

impl From<&str> for FlagValue {
    fn from(v: &str) -> Self {
        FlagValue::String(v.to_string())
    }
}

/// Conversion from a stored [`FlagValue`] into a concrete host type.
///
/// Implemented for exactly the three variant types. There is no cross-type
/// coercion: reading a stored number as `String` yields `None`, and the
/// typed getter falls back to the caller-supplied default.
pub trait FromFlagValue: Sized {
    fn from_flag_value(value: &FlagValue) -> Option<Self>;
}

impl FromFlagValue for bool {
    fn from_flag_value(value: &FlagValue) -> Option<Self> {
        value.as_bool()
    }
}

impl FromFlagValue for f64 {
    fn from_flag_value(value: &FlagValue) -> Option<Self> {
        value.as_f64()
    }
}

impl FromFlagValue for String {
    fn from_flag_value(value: &FlagValue) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}
