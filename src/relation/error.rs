//! Error types for relation support.

/// Error raised while including relation support or building its relation set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationError {
    /// Invalid relation name, unsupported attribute type, or missing default producer
    Configuration(String),
    /// Relation support included before model support
    PrecedingInclude(String),
}

impl std::fmt::Display for RelationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelationError::Configuration(msg) => write!(f, "Relation configuration error: {}", msg),
            RelationError::PrecedingInclude(msg) => write!(f, "Preceding include error: {}", msg),
        }
    }
}

impl std::error::Error for RelationError {}
