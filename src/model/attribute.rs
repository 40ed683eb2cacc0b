//! Attribute metadata and coercion.
//!
//! An [`AttributeDescriptor`] is declared once on a [`ModelBuilder`](crate::ModelBuilder)
//! and is immutable after the model is built. The relation engine reads the
//! `relation`, `lazy`, `default` and `writer` settings; the host uses the
//! primitive type to coerce assigned and lazily produced values.

use std::fmt;
use std::sync::Arc;

use crate::model::{Model, ModelError, ModelResult, Object};
use crate::value::Value;

/// Visibility of a writer or method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Protected => write!(f, "protected"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

/// Callable default producer: receives the owner and the attribute being materialized
pub type DefaultFn = Arc<dyn Fn(&Object, &AttributeDescriptor) -> ModelResult<Value> + Send + Sync>;

/// Where an attribute's default value comes from
#[derive(Clone, Default)]
pub enum DefaultSource {
    /// No default; the attribute reads as `Null` until assigned
    #[default]
    None,
    /// Zero-argument method on the owner
    Method(String),
    /// Callable invoked with the owner
    Callable(DefaultFn),
}

impl DefaultSource {
    /// Wrap a closure as a callable default
    pub fn callable<F>(f: F) -> Self
    where
        F: Fn(&Object, &AttributeDescriptor) -> ModelResult<Value> + Send + Sync + 'static,
    {
        DefaultSource::Callable(Arc::new(f))
    }

    /// Name a zero-argument method as the default producer
    pub fn method(name: impl Into<String>) -> Self {
        DefaultSource::Method(name.into())
    }

    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, DefaultSource::None)
    }
}

impl fmt::Debug for DefaultSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultSource::None => write!(f, "None"),
            DefaultSource::Method(name) => f.debug_tuple("Method").field(name).finish(),
            DefaultSource::Callable(_) => write!(f, "Callable(..)"),
        }
    }
}

/// Primitive type of an attribute
#[derive(Debug, Clone)]
pub enum PrimitiveType {
    /// Accepts any value unchanged
    Any,
    Boolean,
    Integer,
    Float,
    String,
    Symbol,
    /// Raw key/value map
    Hash,
    /// Instance of a model; maps are coerced by constructing the model
    Model(Model),
    /// Sequence of the inner type
    Collection(Box<PrimitiveType>),
}

impl PrimitiveType {
    pub fn collection_of(inner: PrimitiveType) -> Self {
        PrimitiveType::Collection(Box::new(inner))
    }

    /// Numeric ancestry (`Integer`, `Float`)
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, PrimitiveType::Integer | PrimitiveType::Float)
    }

    #[must_use]
    pub fn is_symbol(&self) -> bool {
        matches!(self, PrimitiveType::Symbol)
    }

    /// Innermost element type, looking through nested collections
    #[must_use]
    pub fn element(&self) -> &PrimitiveType {
        match self {
            PrimitiveType::Collection(inner) => inner.element(),
            other => other,
        }
    }

    /// Display name used in errors
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            PrimitiveType::Any => "any".to_string(),
            PrimitiveType::Boolean => "boolean".to_string(),
            PrimitiveType::Integer => "integer".to_string(),
            PrimitiveType::Float => "float".to_string(),
            PrimitiveType::String => "string".to_string(),
            PrimitiveType::Symbol => "symbol".to_string(),
            PrimitiveType::Hash => "map".to_string(),
            PrimitiveType::Model(model) => model.name().to_string(),
            PrimitiveType::Collection(inner) => format!("list<{}>", inner.name()),
        }
    }

    /// Coerce `value` into this type. `Null` passes through for every type.
    pub fn coerce(&self, attribute: &str, value: Value) -> ModelResult<Value> {
        let mismatch = |value: &Value| ModelError::Coercion {
            attribute: attribute.to_string(),
            expected: self.name(),
            actual: value.type_name().to_string(),
        };

        match (self, value) {
            (_, Value::Null) => Ok(Value::Null),
            (PrimitiveType::Any, value) => Ok(value),
            // Identity survives when the wrapped value already has the right type
            (_, Value::Shared(shared)) => {
                let coerced = self.coerce(attribute, shared.value().clone())?;
                if &coerced == shared.value() {
                    Ok(Value::Shared(shared))
                } else {
                    Ok(coerced)
                }
            }

            (PrimitiveType::Boolean, Value::Bool(b)) => Ok(Value::Bool(b)),
            (PrimitiveType::Boolean, Value::String(s)) if s == "true" => Ok(Value::Bool(true)),
            (PrimitiveType::Boolean, Value::String(s)) if s == "false" => Ok(Value::Bool(false)),

            (PrimitiveType::Integer, Value::Integer(i)) => Ok(Value::Integer(i)),
            (PrimitiveType::Integer, Value::Float(f))
                if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 =>
            {
                Ok(Value::Integer(f as i64))
            }
            (PrimitiveType::Integer, Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| mismatch(&Value::String(s))),

            (PrimitiveType::Float, Value::Float(f)) => Ok(Value::Float(f)),
            (PrimitiveType::Float, Value::Integer(i)) => Ok(Value::Float(i as f64)),
            (PrimitiveType::Float, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| mismatch(&Value::String(s))),

            (PrimitiveType::String, Value::String(s) | Value::Symbol(s)) => Ok(Value::String(s)),
            (PrimitiveType::String, Value::Integer(i)) => Ok(Value::String(i.to_string())),
            (PrimitiveType::String, Value::Float(f)) => Ok(Value::String(f.to_string())),

            (PrimitiveType::Symbol, Value::Symbol(s) | Value::String(s)) => Ok(Value::Symbol(s)),

            (PrimitiveType::Hash, Value::Map(map)) => Ok(Value::Map(map)),

            (PrimitiveType::Model(model), Value::Object(object)) => {
                if object.model().is(model) {
                    Ok(Value::Object(object))
                } else {
                    Err(ModelError::Coercion {
                        attribute: attribute.to_string(),
                        expected: model.name().to_string(),
                        actual: object.model().name().to_string(),
                    })
                }
            }
            (PrimitiveType::Model(model), Value::Map(map)) => {
                model.new_instance(Value::Map(map)).map(Value::Object)
            }

            (PrimitiveType::Collection(inner), Value::List(items)) => items
                .into_iter()
                .map(|item| inner.coerce(attribute, item))
                .collect::<ModelResult<Vec<_>>>()
                .map(Value::List),

            (_, value) => Err(mismatch(&value)),
        }
    }
}

/// Metadata for one declared attribute
#[derive(Debug, Clone)]
pub struct AttributeDescriptor {
    name: String,
    primitive: PrimitiveType,
    relation: bool,
    lazy: bool,
    default: DefaultSource,
    writer: Visibility,
    relation_patched: bool,
}

impl AttributeDescriptor {
    pub fn new(name: impl Into<String>, primitive: PrimitiveType) -> Self {
        Self {
            name: name.into(),
            primitive,
            relation: false,
            lazy: false,
            default: DefaultSource::None,
            writer: Visibility::Public,
            relation_patched: false,
        }
    }

    /// Flag the attribute as a relation: assigned values learn their owner
    #[must_use]
    pub fn relation(mut self, relation: bool) -> Self {
        self.relation = relation;
        self
    }

    /// Produce the default on first read instead of at construction
    #[must_use]
    pub fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    #[must_use]
    pub fn default(mut self, default: DefaultSource) -> Self {
        self.default = default;
        self
    }

    #[must_use]
    pub fn writer(mut self, visibility: Visibility) -> Self {
        self.writer = visibility;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn primitive(&self) -> &PrimitiveType {
        &self.primitive
    }

    pub fn is_relation(&self) -> bool {
        self.relation
    }

    pub fn is_lazy(&self) -> bool {
        self.lazy
    }

    pub fn default_source(&self) -> &DefaultSource {
        &self.default
    }

    pub fn writer_visibility(&self) -> Visibility {
        self.writer
    }

    /// Name of the generated writer method
    pub fn writer_name(&self) -> String {
        format!("{}=", self.name)
    }

    /// Coerce into the primitive type. Relation attributes give plain maps,
    /// strings and booleans an identity so they can be bound to an owner.
    pub fn coerce(&self, value: Value) -> ModelResult<Value> {
        let value = self.primitive.coerce(&self.name, value)?;
        if self.relation {
            Ok(value.with_identity())
        } else {
            Ok(value)
        }
    }

    /// Produce the default value for `owner`, coerced. `Null` when there is no default.
    pub fn produce_default(&self, owner: &Object) -> ModelResult<Value> {
        let produced = match &self.default {
            DefaultSource::None => Value::Null,
            DefaultSource::Method(method) => owner.send(method, &[])?,
            DefaultSource::Callable(f) => f(owner, self)?,
        };
        self.coerce(produced)
    }

    pub(crate) fn is_relation_patched(&self) -> bool {
        self.relation_patched
    }

    pub(crate) fn mark_relation_patched(&mut self) {
        self.relation_patched = true;
    }

    pub(crate) fn replace_default(&mut self, default: DefaultSource) {
        self.default = default;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_coercion() {
        assert_eq!(
            PrimitiveType::Integer.coerce("n", Value::from("42")),
            Ok(Value::Integer(42))
        );
        assert_eq!(
            PrimitiveType::Float.coerce("f", Value::Integer(2)),
            Ok(Value::Float(2.0))
        );
        assert_eq!(
            PrimitiveType::Symbol.coerce("s", Value::from("a")),
            Ok(Value::Symbol("a".into()))
        );
        assert_eq!(
            PrimitiveType::Boolean.coerce("b", Value::from("true")),
            Ok(Value::Bool(true))
        );
        assert_eq!(PrimitiveType::Hash.coerce("h", Value::Null), Ok(Value::Null));
    }

    #[test]
    fn test_coercion_mismatch_reports_types() {
        let err = PrimitiveType::Integer
            .coerce("n", Value::empty_map())
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::Coercion {
                attribute: "n".to_string(),
                expected: "integer".to_string(),
                actual: "map".to_string(),
            }
        );
    }

    #[test]
    fn test_collection_coerces_each_element() {
        let list = PrimitiveType::collection_of(PrimitiveType::Integer)
            .coerce("ns", Value::List(vec![Value::from("1"), Value::Integer(2)]))
            .unwrap();
        assert_eq!(list, Value::List(vec![Value::Integer(1), Value::Integer(2)]));
    }

    #[test]
    fn test_out_of_range_float_not_an_integer() {
        assert_eq!(
            PrimitiveType::Integer.coerce("n", Value::Float(-3.0)),
            Ok(Value::Integer(-3))
        );
        for f in [1e20, -1e20, 9_223_372_036_854_775_808.0, f64::INFINITY] {
            assert!(matches!(
                PrimitiveType::Integer.coerce("n", Value::Float(f)),
                Err(ModelError::Coercion { .. })
            ));
        }
    }

    #[test]
    fn test_element_ancestry() {
        let nested = PrimitiveType::collection_of(PrimitiveType::collection_of(PrimitiveType::Symbol));
        assert!(nested.element().is_symbol());
        assert!(PrimitiveType::Float.is_numeric());
        assert!(!PrimitiveType::Hash.element().is_numeric());
    }

    #[test]
    fn test_relation_descriptor_gives_identity() {
        let attr = AttributeDescriptor::new("h", PrimitiveType::Hash).relation(true);
        let stored = attr.coerce(Value::empty_map()).unwrap();
        let shared = stored.as_shared().unwrap().clone();

        // Coercing the stored value again keeps the same instance
        assert_eq!(attr.coerce(stored).unwrap(), Value::Shared(shared.clone()));
        assert_eq!(
            PrimitiveType::Integer.coerce("n", Value::Shared(crate::value::Shared::new(Value::from("7")))),
            Ok(Value::Integer(7))
        );

        let plain = AttributeDescriptor::new("h", PrimitiveType::Hash);
        assert_eq!(plain.coerce(Value::empty_map()), Ok(Value::empty_map()));
    }

    #[test]
    fn test_descriptor_builder() {
        let attr = AttributeDescriptor::new("c_2", PrimitiveType::Any)
            .relation(true)
            .lazy(true)
            .default(DefaultSource::method("load_c_2"))
            .writer(Visibility::Protected);
        assert_eq!(attr.name(), "c_2");
        assert!(attr.is_relation());
        assert!(attr.is_lazy());
        assert!(matches!(attr.default_source(), DefaultSource::Method(m) if m == "load_c_2"));
        assert_eq!(attr.writer_visibility(), Visibility::Protected);
        assert_eq!(attr.writer_name(), "c_2=");
        assert!(!attr.is_relation_patched());
    }

    #[test]
    fn test_visibility_display() {
        assert_eq!(Visibility::Protected.to_string(), "protected");
        assert_eq!(Visibility::default(), Visibility::Public);
    }
}
