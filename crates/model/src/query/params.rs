use crate::core::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The value side of a query-string parameter. In configuration a JSON
/// array is a list and anything else a scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Scalar(Value),
    List(Vec<Value>),
}

impl ParamValue {
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            ParamValue::Scalar(v) => Some(v),
            ParamValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            ParamValue::List(values) => Some(values),
            ParamValue::Scalar(_) => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Scalar(v) => write!(f, "{v}"),
            ParamValue::List(values) => {
                f.write_str("[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<Value> for ParamValue {
    fn from(v: Value) -> Self {
        ParamValue::Scalar(v)
    }
}

impl From<Vec<Value>> for ParamValue {
    fn from(values: Vec<Value>) -> Self {
        ParamValue::List(values)
    }
}

/// Insertion-ordered query parameters.
///
/// Re-setting an existing key replaces the value in place, and removing a
/// key keeps the relative order of the others, so the rendered query string
/// is stable for a given sequence of operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    entries: IndexMap<String, ParamValue>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the parameters from configured defaults, keeping their order.
    pub fn from_defaults(defaults: &IndexMap<String, ParamValue>) -> Self {
        QueryParams {
            entries: defaults.clone(),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.entries.shift_remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The current `per_page` value, if present and a valid integer.
    pub fn per_page(&self) -> Option<u64> {
        self.get("per_page")
            .and_then(ParamValue::as_scalar)
            .and_then(Value::as_u64)
    }
}
