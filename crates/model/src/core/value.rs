use serde::{Deserialize, Serialize};
use std::{borrow::Cow, fmt};

/// A scalar that can appear in a where clause, a default parameter or a
/// query string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
}

impl Value {
    /// Renders the value the way it travels in a query string.
    ///
    /// Booleans become `1`/`0`; `Null` has no wire form and yields `None`,
    /// which callers treat as "omit this parameter".
    pub fn as_query_str(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::Null => None,
            Value::Boolean(true) => Some(Cow::Borrowed("1")),
            Value::Boolean(false) => Some(Cow::Borrowed("0")),
            Value::Int(v) => Some(Cow::Owned(v.to_string())),
            Value::Uint(v) => Some(Cow::Owned(v.to_string())),
            Value::Float(v) => Some(Cow::Owned(v.to_string())),
            Value::String(v) => Some(Cow::Borrowed(v.as_str())),
        }
    }

    /// Interprets the value as a non-negative integer, accepting numeric
    /// strings such as `"50"`.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Int(v) => u64::try_from(*v).ok(),
            Value::Uint(v) => Some(*v),
            Value::Float(v) if v.fract() == 0.0 && *v >= 0.0 => Some(*v as u64),
            Value::String(v) => v.trim().parse::<u64>().ok(),
            Value::Boolean(_) | Value::Float(_) | Value::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_query_str() {
            Some(s) => f.write_str(&s),
            None => f.write_str("NULL"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Uint(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}
