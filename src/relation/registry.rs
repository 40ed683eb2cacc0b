//! Relation set construction.
//!
//! Runs once per model, from [`ModelBuilder::build`](crate::ModelBuilder::build):
//! selects the attributes flagged `relation`, rejects numeric and symbol types,
//! then decorates each attribute's writer and lazy default.
//! Attributes inherited already decorated are kept as they are.

use super::accessor::patch_accessor;
use super::lazy::patch_lazy_default;
use super::{RelationBinder, RelationError};
use crate::model::{AttributeDescriptor, DefaultSource, MethodTable};

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;
#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

/// Validate and decorate the relation attributes of `model`, returning the relation set
pub(crate) fn build_relation_set(
    model: &str,
    attributes: &mut [AttributeDescriptor],
    methods: &mut MethodTable,
    binder: &RelationBinder,
) -> Result<Vec<AttributeDescriptor>, RelationError> {
    #[cfg(feature = "tracing")]
    let _span = tracing_helpers::build_relation_set_span(model).entered();

    // Everything is checked before anything is decorated.
    for attribute in attributes.iter().filter(|a| a.is_relation()) {
        check_relation_attribute(model, attribute, methods)?;
    }

    let mut relation_set = Vec::new();
    for attribute in attributes.iter_mut().filter(|a| a.is_relation()) {
        if !attribute.is_relation_patched() {
            patch_accessor(methods, attribute, binder)?;
            patch_lazy_default(methods, attribute, binder)?;
            attribute.mark_relation_patched();

            log::debug!("{}: {} relates to its owner as {}", model, attribute.name(), binder.name());
            #[cfg(feature = "metrics")]
            METRICS.record_patch();
        }
        relation_set.push(attribute.clone());
    }
    Ok(relation_set)
}

fn check_relation_attribute(
    model: &str,
    attribute: &AttributeDescriptor,
    methods: &MethodTable,
) -> Result<(), RelationError> {
    let element = attribute.primitive().element();
    if element.is_numeric() || element.is_symbol() {
        return Err(RelationError::Configuration(format!(
            "Relations don't work with Numeric and Symbol types ({}.{} is {})",
            model,
            attribute.name(),
            attribute.primitive().name()
        )));
    }
    if attribute.is_lazy() && !attribute.is_relation_patched() {
        if let DefaultSource::Method(method) = attribute.default_source() {
            if !methods.contains(method) {
                return Err(RelationError::Configuration(format!(
                    "default method {} for relation attribute {}.{} is not defined",
                    method,
                    model,
                    attribute.name()
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelBuilder, ModelError, PrimitiveType, Visibility};
    use crate::relation::{RelationName, RelationOptions};
    use crate::value::Value;

    fn child() -> crate::model::Model {
        ModelBuilder::new("C").include_model_support().build().unwrap()
    }

    fn relation_model(attributes: Vec<AttributeDescriptor>) -> Result<crate::model::Model, ModelError> {
        let mut builder = ModelBuilder::new("P")
            .include_model_support()
            .include_relations(RelationOptions::default())
            .unwrap()
            .method("load", Visibility::Public, |_| Ok(Value::empty_map()));
        for attribute in attributes {
            builder = builder.attribute(attribute);
        }
        builder.build()
    }

    #[test]
    fn test_selects_relation_attributes_in_order() {
        let model = relation_model(vec![
            AttributeDescriptor::new("b", PrimitiveType::Model(child())).relation(true),
            AttributeDescriptor::new("plain", PrimitiveType::Integer),
            AttributeDescriptor::new("a", PrimitiveType::collection_of(PrimitiveType::Model(child())))
                .relation(true),
        ])
        .unwrap();

        let names: Vec<&str> = model.relation_attributes().iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert!(model.relation_attributes().iter().all(|a| a.is_relation_patched()));
        assert!(model.methods().contains("b_not_related="));
        assert!(!model.methods().contains("plain_not_related="));
    }

    #[test]
    fn test_numeric_and_symbol_rejected() {
        for primitive in [
            PrimitiveType::Integer,
            PrimitiveType::Float,
            PrimitiveType::Symbol,
            PrimitiveType::collection_of(PrimitiveType::Integer),
        ] {
            let err = relation_model(vec![AttributeDescriptor::new("n", primitive).relation(true)])
                .unwrap_err();
            match err {
                ModelError::Relation(RelationError::Configuration(msg)) => {
                    assert!(msg.starts_with("Relations don't work with Numeric and Symbol types"))
                }
                other => panic!("unexpected error {:?}", other),
            }
        }
    }

    #[test]
    fn test_map_string_and_boolean_relations_bind() {
        let model = relation_model(vec![
            AttributeDescriptor::new("h", PrimitiveType::Hash).relation(true),
            AttributeDescriptor::new("s", PrimitiveType::String).relation(true),
            AttributeDescriptor::new("b", PrimitiveType::Boolean).relation(true),
        ])
        .unwrap();
        let owner = model.new_empty().unwrap();

        for (name, value) in [
            ("h", Value::empty_map()),
            ("s", Value::from("text")),
            ("b", Value::from(true)),
        ] {
            let stored = owner.set(name, value).unwrap();
            let shared = stored.as_shared().unwrap();
            assert!(shared.parent().unwrap().is(&owner));
            assert_eq!(owner.get(name).unwrap(), stored);
        }
        assert_eq!(owner.get("s").unwrap().as_str(), Some("text"));
    }

    #[test]
    fn test_validation_precedes_decoration() {
        let mut attributes = vec![
            AttributeDescriptor::new("ok", PrimitiveType::Model(child())).relation(true),
            AttributeDescriptor::new("bad", PrimitiveType::Symbol).relation(true),
        ];
        let mut methods = MethodTable::new();
        let binder = RelationBinder::new(RelationName::default());

        assert!(build_relation_set("P", &mut attributes, &mut methods, &binder).is_err());
        assert!(methods.is_empty());
        assert!(!attributes[0].is_relation_patched());
    }

    #[test]
    fn test_undefined_lazy_method_rejected() {
        let err = relation_model(vec![AttributeDescriptor::new("c", PrimitiveType::Model(child()))
            .relation(true)
            .lazy(true)
            .default(DefaultSource::method("missing"))])
        .unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_inherited_relations_not_decorated_twice() {
        let parent = relation_model(vec![AttributeDescriptor::new("c", PrimitiveType::Model(child()))
            .relation(true)
            .lazy(true)
            .default(DefaultSource::method("load"))])
        .unwrap();

        let inherited = ModelBuilder::inherit("Q", &parent).build().unwrap();

        assert_eq!(inherited.methods().len(), parent.methods().len());
        assert_eq!(inherited.relation_name(), parent.relation_name());
        assert_eq!(inherited.relation_attributes().len(), 1);

        let owner = inherited.new_empty().unwrap();
        let c = owner.get("c").unwrap();
        assert!(c.as_object().unwrap().parent().unwrap().is(&owner));
    }
}
