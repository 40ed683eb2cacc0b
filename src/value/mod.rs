//! Dynamic attribute values.
//!
//! `Value` is what flows through setters, lazy default producers and the
//! constructor's attribute map. [`Value::Object`] and [`Value::Shared`] carry
//! identity, which is what the back-reference table keys on.

pub mod json;
pub mod shared;

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::model::Object;

pub use shared::Shared;

/// A dynamically typed attribute value
///
/// Equality on `Object` and `Shared` is identity: two handles are equal only
/// when they point at the same instance.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// No value
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// Atom-like name (never a relation target)
    Symbol(String),
    /// Ordered sequence; relation binding applies to each element
    List(Vec<Value>),
    /// Raw key/value map, coerced into a model instance by model-typed attributes
    Map(BTreeMap<String, Value>),
    /// A model instance
    Object(Object),
    /// A map, string or boolean stored by a relation attribute
    Shared(Shared),
}

impl Value {
    /// An empty `Map`, the Rust spelling of a `{}` literal
    #[must_use]
    pub fn empty_map() -> Self {
        Value::Map(BTreeMap::new())
    }

    /// Short name of the variant, used in coercion errors
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
            Value::Shared(shared) => shared.value().type_name(),
        }
    }

    /// Identity of the value, for the values that have one
    #[must_use]
    pub fn identity(&self) -> Option<Uuid> {
        match self {
            Value::Object(o) => Some(o.id()),
            Value::Shared(s) => Some(s.id()),
            _ => None,
        }
    }

    /// Give maps, strings and booleans an identity by wrapping them in [`Shared`].
    ///
    /// Lists are handled element by element, one level deep. Other values,
    /// and values that already have identity, are returned unchanged.
    #[must_use]
    pub fn with_identity(self) -> Value {
        match self {
            Value::List(items) => Value::List(items.into_iter().map(Value::share_plain).collect()),
            other => other.share_plain(),
        }
    }

    fn share_plain(self) -> Value {
        match self {
            plain @ (Value::Bool(_) | Value::String(_) | Value::Map(_)) => {
                Value::Shared(Shared::new(plain))
            }
            other => other,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_shared(&self) -> Option<&Shared> {
        match self {
            Value::Shared(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// The map, looking through a `Shared` wrapper
    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            Value::Shared(shared) => shared.value().as_map(),
            _ => None,
        }
    }

    /// The string or symbol name, looking through a `Shared` wrapper
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Symbol(s) => Some(s),
            Value::Shared(shared) => shared.value().as_str(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Shared(shared) => shared.value().as_bool(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(value: BTreeMap<String, Value>) -> Self {
        Value::Map(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}

impl From<Shared> for Value {
    fn from(value: Shared) -> Self {
        Value::Shared(value)
    }
}
