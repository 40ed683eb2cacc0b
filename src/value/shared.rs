//! Plain values given an identity.
//!
//! Relation attributes store maps, strings and booleans as [`Shared`] so the
//! stored value can be bound to its owner the same way a model instance is.
//! Clones of a `Shared` are the same value; re-assigning one keeps its identity.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::model::Object;
use crate::relation::{self, RelationName};
use crate::value::Value;

struct SharedInner {
    id: Uuid,
    value: Value,
}

impl Drop for SharedInner {
    fn drop(&mut self) {
        relation::binder::forget(self.id);
    }
}

/// A map, string or boolean with identity
#[derive(Clone)]
pub struct Shared {
    inner: Arc<SharedInner>,
}

impl Shared {
    pub fn new(value: Value) -> Self {
        Self {
            inner: Arc::new(SharedInner {
                id: Uuid::new_v4(),
                value,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// The wrapped value
    pub fn value(&self) -> &Value {
        &self.inner.value
    }

    /// Identity comparison
    pub fn is(&self, other: &Shared) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Owner recorded for this value under `name`
    pub fn related(&self, name: &RelationName) -> Option<Object> {
        relation::binder::lookup(self.id(), name.as_str())
    }

    pub fn parent(&self) -> Option<Object> {
        self.related(&RelationName::default())
    }
}

impl PartialEq for Shared {
    fn eq(&self, other: &Self) -> bool {
        self.is(other)
    }
}

impl fmt::Debug for Shared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<shared {} {:?}>", self.id(), self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_identity() {
        let shared = Shared::new(Value::empty_map());
        let other = Shared::new(Value::empty_map());
        assert_eq!(shared, shared.clone());
        assert_ne!(shared, other);
        assert_eq!(shared.value(), other.value());
        assert!(shared.parent().is_none());
    }
}
