//! Model instances.
//!
//! An [`Object`] is a cheap, clonable handle; clones share the same instance and
//! compare equal only to each other. Declared attribute state lives behind a
//! lock inside the instance. Back-references do not: they are kept in the
//! relation side table keyed by [`Object::id`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, Weak};

use uuid::Uuid;

use crate::model::{Model, ModelError, ModelResult, Visibility};
use crate::relation::{self, RelationName};
use crate::value::Value;

pub(crate) struct ObjectInner {
    id: Uuid,
    model: Model,
    state: RwLock<BTreeMap<String, Value>>,
}

impl Drop for ObjectInner {
    fn drop(&mut self) {
        relation::binder::forget(self.id);
    }
}

/// Handle to a model instance
#[derive(Clone)]
pub struct Object {
    inner: Arc<ObjectInner>,
}

/// Non-owning handle, used for owner back-references
#[derive(Clone)]
pub struct WeakObject {
    inner: Weak<ObjectInner>,
}

impl WeakObject {
    pub fn upgrade(&self) -> Option<Object> {
        self.inner.upgrade().map(|inner| Object { inner })
    }
}

impl fmt::Debug for WeakObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(object) => write!(f, "WeakObject({:?})", object),
            None => write!(f, "WeakObject(<dropped>)"),
        }
    }
}

impl Object {
    pub(crate) fn allocate(model: Model) -> Self {
        Self {
            inner: Arc::new(ObjectInner {
                id: Uuid::new_v4(),
                model,
                state: RwLock::new(BTreeMap::new()),
            }),
        }
    }

    /// Identity of this instance
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn model(&self) -> &Model {
        &self.inner.model
    }

    /// Identity comparison
    pub fn is(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn downgrade(&self) -> WeakObject {
        WeakObject {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Snapshot of the declared attribute state.
    ///
    /// Only attributes that have been assigned or materialized appear; relation
    /// back-references never do.
    pub fn attributes(&self) -> BTreeMap<String, Value> {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Read an attribute, materializing a lazy default on first access
    pub fn get(&self, name: &str) -> ModelResult<Value> {
        let attribute = self
            .model()
            .attribute(name)
            .ok_or_else(|| ModelError::UnknownAttribute {
                model: self.model().name().to_string(),
                attribute: name.to_string(),
            })?;

        if let Some(value) = self.read_attribute(name) {
            return Ok(value);
        }
        if !attribute.is_lazy() {
            return Ok(Value::Null);
        }

        // The producer runs without any lock held; it may read other attributes.
        let produced = attribute.produce_default(self)?;
        let (value, previous) = {
            let mut state = self.inner.state.write().unwrap_or_else(PoisonError::into_inner);
            match state.get(name) {
                Some(existing) => (existing.clone(), Some(produced)),
                None => {
                    state.insert(name.to_string(), produced.clone());
                    (produced, None)
                }
            }
        };
        drop(previous);
        Ok(value)
    }

    /// Assign through the public writer `"<name>="`
    pub fn set(&self, name: &str, value: impl Into<Value>) -> ModelResult<Value> {
        self.public_send(&format!("{}=", name), &[value.into()])
    }

    /// Dispatch from inside the instance: visibility is not checked.
    ///
    /// Resolution order is the method table, then attribute readers, then
    /// relation accessors recorded for this instance.
    pub fn send(&self, name: &str, args: &[Value]) -> ModelResult<Value> {
        if let Some(method) = self.model().methods().get(name) {
            return method.invoke(name, self, args);
        }
        self.send_missing(name, args)
    }

    /// Dispatch from outside the instance: only public methods are callable
    pub fn public_send(&self, name: &str, args: &[Value]) -> ModelResult<Value> {
        if let Some(method) = self.model().methods().get(name) {
            if method.visibility() != Visibility::Public {
                return Err(ModelError::Visibility {
                    method: name.to_string(),
                    visibility: method.visibility(),
                });
            }
            return method.invoke(name, self, args);
        }
        self.send_missing(name, args)
    }

    fn send_missing(&self, name: &str, args: &[Value]) -> ModelResult<Value> {
        if args.is_empty() {
            if self.model().attribute(name).is_some() {
                return self.get(name);
            }
            if let Some(owner) = relation::binder::lookup(self.id(), name) {
                return Ok(Value::Object(owner));
            }
        }
        Err(ModelError::NoMethod {
            model: self.model().name().to_string(),
            method: name.to_string(),
        })
    }

    /// Whether `public_send(name, ..)` would find something to call
    pub fn respond_to(&self, name: &str) -> bool {
        match self.model().methods().visibility_of(name) {
            Some(visibility) => visibility == Visibility::Public,
            None => {
                self.model().attribute(name).is_some()
                    || relation::binder::lookup(self.id(), name).is_some()
            }
        }
    }

    /// Owner recorded for this instance under `name`
    pub fn related(&self, name: &RelationName) -> Option<Object> {
        relation::binder::lookup(self.id(), name.as_str())
    }

    /// Owner recorded under the default relation name, `parent`
    pub fn parent(&self) -> Option<Object> {
        self.related(&RelationName::default())
    }

    /// Structural copy: new identity, shallow copy of declared state.
    ///
    /// Back-references are not part of the state; the duplication hook
    /// re-establishes them on the copy.
    pub fn dup(&self) -> Object {
        let copy = Object::allocate(self.model().clone());
        *copy.inner.state.write().unwrap_or_else(PoisonError::into_inner) = self.attributes();
        relation::hooks::after_duplicate(self, &copy);
        copy
    }

    pub(crate) fn read_attribute(&self, name: &str) -> Option<Value> {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Coerce and store, bypassing writers. Returns the stored value.
    pub(crate) fn assign_attribute(&self, name: &str, value: Value) -> ModelResult<Value> {
        let attribute = self
            .model()
            .attribute(name)
            .ok_or_else(|| ModelError::UnknownAttribute {
                model: self.model().name().to_string(),
                attribute: name.to_string(),
            })?;
        let stored = attribute.coerce(value)?;
        let previous = self
            .inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), stored.clone());
        drop(previous);
        Ok(stored)
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.is(other)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<{} {}>", self.model().name(), self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttributeDescriptor, DefaultSource, Method, ModelBuilder, PrimitiveType};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn plain_model() -> Model {
        ModelBuilder::new("Plain")
            .include_model_support()
            .attribute(AttributeDescriptor::new("name", PrimitiveType::String))
            .attribute(
                AttributeDescriptor::new("secret", PrimitiveType::String).writer(Visibility::Private),
            )
            .method("shout", Visibility::Protected, |_| Ok(Value::from("HEY")))
            .build()
            .unwrap()
    }

    #[test]
    fn test_identity_equality() {
        let model = plain_model();
        let a = model.new_empty().unwrap();
        let b = model.new_empty().unwrap();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert!(a.is(&a.clone()));
    }

    #[test]
    fn test_set_and_get() {
        let object = plain_model().new_empty().unwrap();
        assert_eq!(object.get("name").unwrap(), Value::Null);
        object.set("name", "ada").unwrap();
        assert_eq!(object.get("name").unwrap(), Value::from("ada"));
        assert_eq!(object.send("name", &[]).unwrap(), Value::from("ada"));
    }

    #[test]
    fn test_unknown_attribute() {
        let object = plain_model().new_empty().unwrap();
        assert!(matches!(
            object.get("nope"),
            Err(ModelError::UnknownAttribute { .. })
        ));
        assert!(matches!(
            object.send("nope", &[]),
            Err(ModelError::NoMethod { .. })
        ));
    }

    #[test]
    fn test_private_writer_rejected_from_outside() {
        let object = plain_model().new_empty().unwrap();
        let err = object.set("secret", "x").unwrap_err();
        assert_eq!(
            err,
            ModelError::Visibility {
                method: "secret=".to_string(),
                visibility: Visibility::Private,
            }
        );
        // Internal dispatch ignores visibility
        object.send("secret=", &[Value::from("x")]).unwrap();
        assert_eq!(object.get("secret").unwrap(), Value::from("x"));
    }

    #[test]
    fn test_respond_to() {
        let object = plain_model().new_empty().unwrap();
        assert!(object.respond_to("name"));
        assert!(object.respond_to("name="));
        assert!(!object.respond_to("secret="));
        assert!(!object.respond_to("shout"));
        assert!(!object.respond_to("parent"));
        assert_eq!(object.send("shout", &[]).unwrap(), Value::from("HEY"));
    }

    #[test]
    fn test_arity_checked() {
        let object = plain_model().new_empty().unwrap();
        assert!(matches!(
            object.send("name=", &[]),
            Err(ModelError::Arity { expected: 1, actual: 0, .. })
        ));
    }

    #[test]
    fn test_lazy_default_materialized_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let model = ModelBuilder::new("Lazy")
            .include_model_support()
            .attribute(
                AttributeDescriptor::new("n", PrimitiveType::Integer)
                    .lazy(true)
                    .default(DefaultSource::callable(move |_, _| {
                        Ok(Value::Integer(counter.fetch_add(1, Ordering::SeqCst) as i64 + 10))
                    })),
            )
            .build()
            .unwrap();

        let object = model.new_empty().unwrap();
        assert!(object.attributes().is_empty());
        assert_eq!(object.get("n").unwrap(), Value::Integer(10));
        assert_eq!(object.get("n").unwrap(), Value::Integer(10));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_method_default_reads_other_attributes() {
        let model = ModelBuilder::new("Greeter")
            .include_model_support()
            .attribute(AttributeDescriptor::new("name", PrimitiveType::String))
            .attribute(
                AttributeDescriptor::new("greeting", PrimitiveType::String)
                    .lazy(true)
                    .default(DefaultSource::method("build_greeting")),
            )
            .define_method(
                "build_greeting",
                Method::new(0, |this, _| {
                    let name = this.get("name")?;
                    Ok(Value::from(format!("hello {}", name.as_str().unwrap_or("?"))))
                }),
            )
            .build()
            .unwrap();

        let object = model.new_instance(json!({ "name": "ada" })).unwrap();
        assert_eq!(object.get("greeting").unwrap(), Value::from("hello ada"));
    }

    #[test]
    fn test_dup_copies_state_with_new_identity() {
        let object = plain_model().new_instance(json!({ "name": "ada" })).unwrap();
        let copy = object.dup();
        assert!(!copy.is(&object));
        assert_eq!(copy.attributes(), object.attributes());
        copy.set("name", "grace").unwrap();
        assert_eq!(object.get("name").unwrap(), Value::from("ada"));
    }
}
