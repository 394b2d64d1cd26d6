//! Typed option values.

use serde::{Serialize, Serializer};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A value passed through without being examined.
///
/// Two handles are equal only when they point at the same allocation.
#[derive(Clone)]
pub struct Opaque(Arc<dyn Any + Send + Sync>);

impl Opaque {
    /// Wrap any value in a new handle.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Borrow the wrapped value if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// The wrapped JSON structure, when the handle came from JSON input.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        self.downcast_ref::<serde_json::Value>()
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_json() {
            Some(json) => write!(f, "Opaque({})", json),
            None => f.write_str("Opaque(..)"),
        }
    }
}

/// The value of a single option.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
    Opaque(Opaque),
}

impl OptionValue {
    /// Wrap an arbitrary value as an opaque handle.
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        OptionValue::Opaque(Opaque::new(value))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            OptionValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            OptionValue::Float(n) => Some(*n),
            OptionValue::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, OptionValue::Null)
    }

    /// Short human description used in error messages.
    ///
    /// Scalars are quoted (`"abc"`, `"12"`), everything else is named in
    /// parentheses (`(true)`, `(null)`, `(array)`).
    pub fn describe(&self) -> String {
        match self {
            OptionValue::String(s) => format!("\"{}\"", s),
            OptionValue::Integer(n) => format!("\"{}\"", n),
            OptionValue::Float(n) => format!("\"{}\"", n),
            OptionValue::Boolean(b) => format!("({})", b),
            OptionValue::Null => "(null)".to_string(),
            OptionValue::Opaque(handle) => match handle.as_json() {
                Some(serde_json::Value::Array(_)) => "(array)".to_string(),
                Some(serde_json::Value::Object(_)) => "(object)".to_string(),
                _ => "(opaque)".to_string(),
            },
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::String(s) => f.write_str(s),
            OptionValue::Integer(n) => write!(f, "{}", n),
            OptionValue::Float(n) => write!(f, "{}", n),
            OptionValue::Boolean(b) => write!(f, "{}", b),
            OptionValue::Null => f.write_str("null"),
            OptionValue::Opaque(handle) => match handle.as_json() {
                Some(json) => write!(f, "{}", json),
                None => f.write_str("(opaque)"),
            },
        }
    }
}

impl Serialize for OptionValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            OptionValue::String(s) => serializer.serialize_str(s),
            OptionValue::Integer(n) => serializer.serialize_i64(*n),
            OptionValue::Float(n) => serializer.serialize_f64(*n),
            OptionValue::Boolean(b) => serializer.serialize_bool(*b),
            OptionValue::Null => serializer.serialize_unit(),
            OptionValue::Opaque(handle) => match handle.as_json() {
                Some(json) => json.serialize(serializer),
                None => serializer.serialize_str("(opaque)"),
            },
        }
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::String(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::String(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Integer(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        OptionValue::Integer(value.into())
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Float(value)
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Boolean(value)
    }
}

impl<T: Into<OptionValue>> From<Option<T>> for OptionValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(OptionValue::Null, Into::into)
    }
}

impl From<serde_json::Value> for OptionValue {
    /// Scalars map onto their variants; arrays and objects are kept whole as
    /// opaque handles. Numbers that fit neither i64 nor f64 become strings.
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => OptionValue::Null,
            serde_json::Value::Bool(b) => OptionValue::Boolean(b),
            serde_json::Value::String(s) => OptionValue::String(s),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    OptionValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    OptionValue::Float(f)
                } else {
                    OptionValue::String(n.to_string())
                }
            }
            other => OptionValue::Opaque(Opaque::new(other)),
        }
    }
}
