//! Relation support: owner back-references for relation attributes.
//!
//! Including relations on a model (see [`ModelBuilder::include_relations`])
//! has four effects:
//! - the writer of every attribute flagged `relation` is decorated so the
//!   assigned value learns its owner,
//! - lazy default producers of those attributes are decorated the same way,
//! - construction binds relation attributes that arrived in the attribute map,
//! - duplication carries the original's owner over to the copy.
//!
//! All decoration happens once, while the model is built.
//!
//! [`ModelBuilder::include_relations`]: crate::ModelBuilder::include_relations

pub mod accessor;
pub mod binder;
pub mod error;
pub mod hooks;
pub mod lazy;
pub mod name;
pub mod registry;

pub use binder::RelationBinder;
pub use error::RelationError;
pub use name::{RelationName, RelationOptions, DEFAULT_RELATION_NAME};

use crate::model::{AttributeDescriptor, Object};
use crate::value::Value;

/// Relation support installed on a model: the binder for its relation name
/// and the relation set computed at build time
#[derive(Debug, Clone)]
pub struct Relations {
    binder: RelationBinder,
    attributes: Vec<AttributeDescriptor>,
}

impl Relations {
    pub(crate) fn new(binder: RelationBinder, attributes: Vec<AttributeDescriptor>) -> Self {
        Self { binder, attributes }
    }

    pub fn name(&self) -> &RelationName {
        self.binder.name()
    }

    pub fn binder(&self) -> &RelationBinder {
        &self.binder
    }

    /// Relation attributes in declaration order
    pub fn attributes(&self) -> &[AttributeDescriptor] {
        &self.attributes
    }

    pub fn relate<'v>(&self, value: &'v Value, owner: &Object) -> &'v Value {
        self.binder.relate(value, owner)
    }
}
