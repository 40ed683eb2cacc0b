//! Writer decoration for relation attributes.
//!
//! `"<attr>="` is replaced by a writer that calls the original (coerce and
//! store), relates the stored value to the receiver and returns it. The
//! original stays reachable under the private alias `"<attr>_not_related="`.

use super::{RelationBinder, RelationError};
use crate::model::{AttributeDescriptor, Method, MethodTable, Visibility};

/// Private alias the original writer of `attribute` is kept under
pub fn original_writer_name(attribute: &str) -> String {
    format!("{}_not_related=", attribute)
}

/// Decorate the writer of `attribute`. Returns `false` when it is already decorated.
pub(crate) fn patch_accessor(
    methods: &mut MethodTable,
    attribute: &AttributeDescriptor,
    binder: &RelationBinder,
) -> Result<bool, RelationError> {
    let writer = attribute.writer_name();
    let alias = original_writer_name(attribute.name());
    if methods.contains(&alias) {
        return Ok(false);
    }
    if !methods.alias(alias.clone(), &writer, Visibility::Private) {
        return Err(RelationError::Configuration(format!(
            "relation attribute {} has no writer",
            attribute.name()
        )));
    }

    let binder = binder.clone();
    methods.define(
        writer,
        Method::new(1, move |owner, args| {
            let stored = owner.send(&alias, args)?;
            binder.relate(&stored, owner);
            Ok(stored)
        })
        .with_visibility(attribute.writer_visibility()),
    );
    Ok(true)
}
