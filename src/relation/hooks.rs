//! Construction and duplication hooks.

use std::collections::BTreeMap;

use super::{binder, RelationBinder, RelationName, Relations};
use crate::model::Object;
use crate::value::Value;

/// After construction: bind the relation attributes that arrived in the
/// attribute map.
///
/// Attributes left to defaults are skipped; lazy ones are bound when first
/// read. This also keeps a child's own relation attributes from being bound
/// while the child itself is being constructed as part of its owner's map.
pub(crate) fn after_initialize(relations: &Relations, object: &Object, assigned: &BTreeMap<String, Value>) {
    for attribute in relations.attributes() {
        if !assigned.contains_key(attribute.name()) {
            continue;
        }
        if let Some(value) = object.read_attribute(attribute.name()) {
            relations.relate(&value, object);
        }
    }
}

/// After duplication: give `copy` the owners `original` currently resolves.
///
/// The original's own configured relation name is checked first, then any
/// other name it was bound under by an owner of a different model.
pub(crate) fn after_duplicate(original: &Object, copy: &Object) {
    let mut names: Vec<RelationName> = original.model().relation_name().cloned().into_iter().collect();
    for name in binder::relation_names_of(original.id()) {
        if !names.contains(&name) {
            names.push(name);
        }
    }

    let copied = Value::Object(copy.clone());
    for name in names {
        let binder = RelationBinder::new(name);
        if let Some(owner) = binder.owner_of(original) {
            binder.relate(&copied, &owner);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{AttributeDescriptor, DefaultSource, ModelBuilder, PrimitiveType};
    use crate::relation::RelationOptions;
    use crate::value::Value;
    use serde_json::json;

    #[test]
    fn test_only_mass_assigned_relations_bound() {
        let child = ModelBuilder::new("C").include_model_support().build().unwrap();
        let owner_model = ModelBuilder::new("P")
            .include_model_support()
            .include_relations(RelationOptions::default())
            .unwrap()
            .attribute(AttributeDescriptor::new("given", PrimitiveType::Model(child.clone())).relation(true))
            .attribute(
                AttributeDescriptor::new("eager", PrimitiveType::Model(child))
                    .relation(true)
                    .default(DefaultSource::callable(|_, _| Ok(Value::empty_map()))),
            )
            .build()
            .unwrap();

        let owner = owner_model.new_instance(json!({ "given": {} })).unwrap();

        let given = owner.get("given").unwrap();
        assert!(given.as_object().unwrap().parent().unwrap().is(&owner));
        let eager = owner.get("eager").unwrap();
        assert!(eager.as_object().unwrap().parent().is_none());
    }

    #[test]
    fn test_dup_of_unbound_object_stays_unbound() {
        let model = ModelBuilder::new("C").include_model_support().build().unwrap();
        let original = model.new_empty().unwrap();
        let copy = original.dup();
        assert!(copy.parent().is_none());
    }

    #[test]
    fn test_dup_carries_every_bound_name() {
        let child = ModelBuilder::new("C").include_model_support().build().unwrap();
        let p = ModelBuilder::new("P")
            .include_model_support()
            .include_relations(RelationOptions::default())
            .unwrap()
            .attribute(AttributeDescriptor::new("c", PrimitiveType::Model(child.clone())).relation(true))
            .build()
            .unwrap();
        let f = ModelBuilder::new("F")
            .include_model_support()
            .include_relations(RelationOptions::named("father"))
            .unwrap()
            .attribute(AttributeDescriptor::new("c", PrimitiveType::Model(child)).relation(true))
            .build()
            .unwrap();

        let parent = p.new_instance(json!({ "c": {} })).unwrap();
        let father = f.new_empty().unwrap();
        let c = parent.get("c").unwrap();
        father.set("c", c.clone()).unwrap();

        let c = c.as_object().unwrap();
        let copy = c.dup();
        assert!(!copy.is(c));
        assert!(copy.parent().unwrap().is(&parent));
        assert!(copy.send("father", &[]).unwrap().as_object().unwrap().is(&father));
        assert!(copy.attributes().is_empty());
    }
}
