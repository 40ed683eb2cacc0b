//! # Lineage
//!
//! Owner back-references for relation attributes.
//!
//! Any object assigned to an attribute declared with `relation(true)` learns
//! who its owner is. The back-reference lives in a side table keyed by the
//! child's identity, so it never shows up in the child's declared state.
//!
//! ```no_run
//! use lineage::{AttributeDescriptor, ModelBuilder, PrimitiveType, RelationOptions};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let child = ModelBuilder::new("C").include_model_support().build()?;
//! let owner = ModelBuilder::new("P")
//!     .include_model_support()
//!     .include_relations(RelationOptions::default())?
//!     .attribute(AttributeDescriptor::new("c_1", PrimitiveType::Model(child)).relation(true))
//!     .build()?;
//!
//! let p = owner.new_instance(json!({ "c_1": {} }))?;
//! let c = p.get("c_1")?;
//! assert!(c.as_object().and_then(|c| c.parent()).is_some_and(|o| o.is(&p)));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod metrics;
pub mod model;
pub mod relation;
pub mod value;

pub use config::RelationsConfig;
pub use model::{
    AttributeDescriptor, DefaultSource, Method, MethodTable, Model, ModelBuilder, ModelError,
    ModelResult, Object, PrimitiveType, Visibility,
};
pub use relation::{RelationBinder, RelationError, RelationName, RelationOptions};
pub use value::{Shared, Value};
