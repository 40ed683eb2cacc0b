//! Error types for model operations.
//!
//! This module provides the `ModelError` enum for errors raised while building
//! models, constructing instances, coercing values and dispatching methods.

use crate::model::Visibility;
use crate::relation::RelationError;

/// Result alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Error type for model operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Value could not be coerced into the attribute's primitive type
    Coercion {
        attribute: String,
        expected: String,
        actual: String,
    },
    /// Attribute is not declared on the model
    UnknownAttribute { model: String, attribute: String },
    /// No method, reader or relation accessor under this name
    NoMethod { model: String, method: String },
    /// Method exists but is not callable from outside the instance
    Visibility {
        method: String,
        visibility: Visibility,
    },
    /// Wrong number of arguments
    Arity {
        method: String,
        expected: usize,
        actual: usize,
    },
    /// Relation support misconfigured
    Relation(RelationError),
    /// Other error
    Other(String),
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::Coercion {
                attribute,
                expected,
                actual,
            } => write!(
                f,
                "Cannot coerce value for attribute {}: expected {}, got {}",
                attribute, expected, actual
            ),
            ModelError::UnknownAttribute { model, attribute } => {
                write!(f, "Unknown attribute {} for model {}", attribute, model)
            }
            ModelError::NoMethod { model, method } => {
                write!(f, "Undefined method {} for model {}", method, model)
            }
            ModelError::Visibility { method, visibility } => {
                write!(f, "{} method {} called from outside the instance", visibility, method)
            }
            ModelError::Arity {
                method,
                expected,
                actual,
            } => write!(
                f,
                "Wrong number of arguments for {}: expected {}, given {}",
                method, expected, actual
            ),
            ModelError::Relation(err) => write!(f, "{}", err),
            ModelError::Other(msg) => write!(f, "Model error: {}", msg),
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::Relation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RelationError> for ModelError {
    fn from(err: RelationError) -> Self {
        ModelError::Relation(err)
    }
}
