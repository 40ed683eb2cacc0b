//! Lazy default decoration for relation attributes.
//!
//! Whenever a lazy relation attribute's default producer runs, its result is
//! coerced and related to the owner before the host caches it. The host still
//! decides when the producer runs (at most once per instance).
//!
//! Two producer shapes are handled:
//! - `Callable(f)`: replaced by a callable that calls `f`, coerces and relates.
//! - `Method(m)`: `m` is kept under the private alias `"<m>_not_related"` and
//!   redefined, with its original visibility, to call the alias, coerce and relate.
//!   The attribute's own producer calls the alias and coerces for itself, so
//!   several attributes of different types can share `m`. A direct call of `m`
//!   coerces for the first attribute that named it.

use super::{RelationBinder, RelationError};
use crate::model::{AttributeDescriptor, DefaultSource, Method, MethodTable, Visibility};

/// Private alias the original default method `method` is kept under
pub fn original_default_name(method: &str) -> String {
    format!("{}_not_related", method)
}

/// Decorate the default producer of a lazy `attribute` in place.
/// Attributes already decorated are left alone.
pub(crate) fn patch_lazy_default(
    methods: &mut MethodTable,
    attribute: &mut AttributeDescriptor,
    binder: &RelationBinder,
) -> Result<(), RelationError> {
    if !attribute.is_lazy() || attribute.is_relation_patched() {
        return Ok(());
    }

    match attribute.default_source().clone() {
        DefaultSource::None => Ok(()),
        DefaultSource::Callable(original) => {
            let binder = binder.clone();
            attribute.replace_default(DefaultSource::callable(move |owner, attribute| {
                let value = attribute.coerce(original(owner, attribute)?)?;
                binder.relate(&value, owner);
                Ok(value)
            }));
            Ok(())
        }
        DefaultSource::Method(method) => {
            patch_default_method(methods, attribute, &method, binder)?;

            let alias = original_default_name(&method);
            let binder = binder.clone();
            attribute.replace_default(DefaultSource::callable(move |owner, attribute| {
                let value = attribute.coerce(owner.send(&alias, &[])?)?;
                binder.relate(&value, owner);
                Ok(value)
            }));
            Ok(())
        }
    }
}

/// Redefine `method` once; later attributes naming it reuse the alias.
fn patch_default_method(
    methods: &mut MethodTable,
    attribute: &AttributeDescriptor,
    method: &str,
    binder: &RelationBinder,
) -> Result<(), RelationError> {
    let alias = original_default_name(method);
    if methods.contains(&alias) {
        return Ok(());
    }
    let visibility = methods.visibility_of(method).ok_or_else(|| {
        RelationError::Configuration(format!(
            "default method {} for relation attribute {} is not defined",
            method,
            attribute.name()
        ))
    })?;
    methods.alias(alias.clone(), method, Visibility::Private);

    let binder = binder.clone();
    let coercer = attribute.clone();
    methods.define(
        method,
        Method::new(0, move |owner, _| {
            let value = coercer.coerce(owner.send(&alias, &[])?)?;
            binder.relate(&value, owner);
            Ok(value)
        })
        .with_visibility(visibility),
    );
    Ok(())
}
