//! Models: declared attributes, methods and construction.
//!
//! A [`Model`] is built once through [`ModelBuilder`]. Building generates one
//! writer per attribute and, when relation support is included, decorates the
//! writers and lazy default producers of relation attributes. After `build()`
//! the model is immutable.
//!
//! # Example
//!
//! ```no_run
//! use lineage::{AttributeDescriptor, DefaultSource, ModelBuilder, PrimitiveType, RelationOptions, Value};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let c = ModelBuilder::new("C").include_model_support().build()?;
//! let p = ModelBuilder::new("P")
//!     .include_model_support()
//!     .include_relations(RelationOptions::default())?
//!     .attribute(
//!         AttributeDescriptor::new("c_2", PrimitiveType::Model(c))
//!             .relation(true)
//!             .lazy(true)
//!             .default(DefaultSource::method("load_c_2")),
//!     )
//!     .method("load_c_2", lineage::Visibility::Public, |_| Ok(Value::empty_map()))
//!     .build()?;
//!
//! let owner = p.new_empty()?;
//! let child = owner.get("c_2")?;
//! assert!(child.as_object().and_then(|c| c.parent()).is_some());
//! # Ok(())
//! # }
//! ```

pub mod attribute;
pub mod error;
pub mod method;
pub mod object;

#[doc(inline)]
pub use attribute::{AttributeDescriptor, DefaultFn, DefaultSource, PrimitiveType, Visibility};
#[doc(inline)]
pub use error::{ModelError, ModelResult};
#[doc(inline)]
pub use method::{Method, MethodFn, MethodTable};
#[doc(inline)]
pub use object::{Object, WeakObject};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::relation::{self, RelationBinder, RelationError, RelationName, RelationOptions, Relations};
use crate::value::Value;

struct ModelInner {
    name: String,
    attributes: Vec<AttributeDescriptor>,
    methods: MethodTable,
    model_support: bool,
    relations: Option<Relations>,
}

/// A built model type. Cheap to clone; clones refer to the same type.
#[derive(Clone)]
pub struct Model {
    inner: Arc<ModelInner>,
}

impl Model {
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Declared attributes in declaration order
    pub fn attributes(&self) -> &[AttributeDescriptor] {
        &self.inner.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.inner.attributes.iter().find(|a| a.name() == name)
    }

    pub fn methods(&self) -> &MethodTable {
        &self.inner.methods
    }

    /// Type identity
    pub fn is(&self, other: &Model) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Whether constructor and mass assignment support is included
    pub fn supports_mass_assignment(&self) -> bool {
        self.inner.model_support
    }

    /// Relation support, when included
    pub fn relations(&self) -> Option<&Relations> {
        self.inner.relations.as_ref()
    }

    /// Configured relation name, when relation support is included
    pub fn relation_name(&self) -> Option<&RelationName> {
        self.relations().map(Relations::name)
    }

    /// The relation set: attributes flagged `relation`, already decorated.
    /// Empty when relation support is not included.
    pub fn relation_attributes(&self) -> &[AttributeDescriptor] {
        self.relations().map(Relations::attributes).unwrap_or(&[])
    }

    /// Make `owner` the owner of `value` (or of each element of a list) under
    /// this model's relation name, or `parent` when relations are not included.
    pub fn relate<'v>(&self, value: &'v Value, owner: &Object) -> &'v Value {
        match self.relations() {
            Some(relations) => relations.relate(value, owner),
            None => RelationBinder::new(RelationName::default()).relate(value, owner),
        }
    }

    /// Construct an instance with no attribute map
    pub fn new_empty(&self) -> ModelResult<Object> {
        self.new_instance(Value::Null)
    }

    /// Construct an instance from a key → value map (mass assignment).
    ///
    /// Keys without a public writer are ignored. Non-lazy defaults are applied
    /// for absent keys. When relation support is included, relation attributes
    /// present in the map are bound to the new instance.
    pub fn new_instance(&self, attributes: impl Into<Value>) -> ModelResult<Object> {
        let assigned = match attributes.into() {
            Value::Null => BTreeMap::new(),
            Value::Map(map) => map,
            other => {
                return Err(ModelError::Coercion {
                    attribute: format!("{}.new", self.name()),
                    expected: "map".to_string(),
                    actual: other.type_name().to_string(),
                })
            }
        };
        if !assigned.is_empty() && !self.supports_mass_assignment() {
            return Err(ModelError::Other(format!(
                "{} does not accept an attribute map; include model support first",
                self.name()
            )));
        }

        let object = Object::allocate(self.clone());
        for attribute in self.attributes() {
            match assigned.get(attribute.name()) {
                Some(value) if attribute.writer_visibility() == Visibility::Public => {
                    object.assign_attribute(attribute.name(), value.clone())?;
                }
                Some(_) => {
                    log::debug!(
                        "{}: ignoring mass-assigned {} without a public writer",
                        self.name(),
                        attribute.name()
                    );
                }
                None if !attribute.is_lazy() && !attribute.default_source().is_none() => {
                    let value = attribute.produce_default(&object)?;
                    object.assign_attribute(attribute.name(), value)?;
                }
                None => {}
            }
        }
        for key in assigned.keys().filter(|key| self.attribute(key).is_none()) {
            log::debug!("{}: ignoring unknown attribute {}", self.name(), key);
        }

        if let Some(relations) = self.relations() {
            relation::hooks::after_initialize(relations, &object, &assigned);
        }
        Ok(object)
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.inner.name)
            .field("attributes", &self.inner.attributes.len())
            .field("relation_name", &self.relation_name())
            .finish()
    }
}

/// Declares a model
pub struct ModelBuilder {
    name: String,
    attributes: Vec<AttributeDescriptor>,
    methods: MethodTable,
    model_support: bool,
    relation_name: Option<RelationName>,
}

impl ModelBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            methods: MethodTable::new(),
            model_support: false,
            relation_name: None,
        }
    }

    /// Start from an existing model: attributes, methods and included support
    /// are inherited. Already decorated relation attributes are not decorated again.
    pub fn inherit(name: impl Into<String>, parent: &Model) -> Self {
        Self {
            name: name.into(),
            attributes: parent.attributes().to_vec(),
            methods: parent.methods().clone(),
            model_support: parent.supports_mass_assignment(),
            relation_name: parent.relation_name().cloned(),
        }
    }

    /// Include constructor and mass assignment support
    #[must_use]
    pub fn include_model_support(mut self) -> Self {
        self.model_support = true;
        self
    }

    /// Include relation support. Model support must already be included.
    pub fn include_relations(mut self, options: RelationOptions) -> Result<Self, RelationError> {
        if !self.model_support {
            return Err(RelationError::PrecedingInclude(format!(
                "model support must be included prior to relations on {}",
                self.name
            )));
        }
        if let Some(existing) = &self.relation_name {
            return Err(RelationError::Configuration(format!(
                "relations are already included on {} as {}",
                self.name, existing
            )));
        }
        self.relation_name = Some(options.relation_name()?);
        Ok(self)
    }

    /// Declare an attribute. Redeclaring a name replaces the earlier declaration.
    #[must_use]
    pub fn attribute(mut self, attribute: AttributeDescriptor) -> Self {
        match self.attributes.iter_mut().find(|a| a.name() == attribute.name()) {
            Some(existing) => *existing = attribute,
            None => self.attributes.push(attribute),
        }
        self
    }

    /// Define a zero-argument method
    #[must_use]
    pub fn method<F>(self, name: impl Into<String>, visibility: Visibility, body: F) -> Self
    where
        F: Fn(&Object) -> ModelResult<Value> + Send + Sync + 'static,
    {
        self.define_method(
            name,
            Method::new(0, move |this, _| body(this)).with_visibility(visibility),
        )
    }

    #[must_use]
    pub fn define_method(mut self, name: impl Into<String>, method: Method) -> Self {
        self.methods.define(name, method);
        self
    }

    /// Generate writers, decorate relation attributes and freeze the model
    pub fn build(mut self) -> ModelResult<Model> {
        for attribute in &self.attributes {
            let writer = attribute.writer_name();
            if self.methods.contains(&writer) {
                continue;
            }
            let name = attribute.name().to_string();
            self.methods.define(
                writer,
                Method::new(1, move |this, args| this.assign_attribute(&name, args[0].clone()))
                    .with_visibility(attribute.writer_visibility()),
            );
        }

        let relations = match self.relation_name {
            Some(name) => {
                let binder = RelationBinder::new(name);
                let set = relation::registry::build_relation_set(
                    &self.name,
                    &mut self.attributes,
                    &mut self.methods,
                    &binder,
                )?;
                Some(Relations::new(binder, set))
            }
            None => None,
        };

        Ok(Model {
            inner: Arc::new(ModelInner {
                name: self.name,
                attributes: self.attributes,
                methods: self.methods,
                model_support: self.model_support,
                relations,
            }),
        })
    }
}
