//! The `relate` primitive and the back-reference table.
//!
//! Back-references are recorded out of band: child id → relation name → weak
//! owner handle. The child's declared state never sees them, and the owner is
//! held weakly so a child cannot keep it alive. Entries for a child are removed
//! when the child is dropped.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use once_cell::sync::Lazy;
use uuid::Uuid;

use super::RelationName;
use crate::model::{Object, WeakObject};
use crate::value::Value;

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;
#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

type BackReferences = HashMap<Uuid, HashMap<RelationName, WeakObject>>;

static BACK_REFERENCES: Lazy<RwLock<BackReferences>> = Lazy::new(|| RwLock::new(HashMap::new()));

/// Binds values to an owner under one relation name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationBinder {
    name: RelationName,
}

impl RelationBinder {
    pub fn new(name: RelationName) -> Self {
        Self { name }
    }

    pub fn name(&self) -> &RelationName {
        &self.name
    }

    /// Make `owner` the owner of `value`, or of each element when `value` is a list.
    ///
    /// Nested lists are not descended into. Only objects and shared values
    /// have identity; anything else is left alone. A later `relate` on the same instance replaces the earlier owner.
    /// Returns `value`.
    pub fn relate<'v>(&self, value: &'v Value, owner: &Object) -> &'v Value {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::relate_span(self.name.as_str()).entered();

        match value {
            Value::List(items) => {
                for item in items {
                    self.bind(item, owner);
                }
            }
            other => self.bind(other, owner),
        }
        value
    }

    /// Owner of `child` under this relation name
    pub fn owner_of(&self, child: &Object) -> Option<Object> {
        lookup(child.id(), self.name.as_str())
    }

    fn bind(&self, value: &Value, owner: &Object) {
        let Some(child) = value.identity() else {
            return;
        };
        attach(child, self.name.clone(), owner.downgrade());
        log::debug!("bound {:?} to {:?} as {}", value, owner, self.name);

        #[cfg(feature = "metrics")]
        METRICS.record_relate();
    }
}

fn attach(child: Uuid, name: RelationName, owner: WeakObject) {
    let previous = BACK_REFERENCES
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(child)
        .or_default()
        .insert(name, owner);
    drop(previous);
}

/// Live owner of `child` under `name`
pub(crate) fn lookup(child: Uuid, name: &str) -> Option<Object> {
    let owner = BACK_REFERENCES
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&child)
        .and_then(|names| names.get(name))
        .cloned();
    owner.and_then(|weak| weak.upgrade())
}

/// Relation names `child` has been bound under, in name order
pub(crate) fn relation_names_of(child: Uuid) -> Vec<RelationName> {
    let mut names: Vec<RelationName> = BACK_REFERENCES
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&child)
        .map(|names| names.keys().cloned().collect())
        .unwrap_or_default();
    names.sort();
    names
}

/// Drop every back-reference recorded for `child`
pub(crate) fn forget(child: Uuid) {
    let removed = BACK_REFERENCES
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(&child);
    drop(removed);
}
