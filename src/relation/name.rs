//! Relation names and inclusion options.

use std::borrow::Borrow;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use super::RelationError;

/// Relation name used when none is configured
pub const DEFAULT_RELATION_NAME: &str = "parent";

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("relation name pattern is valid"));

/// Name under which a child exposes its owner, e.g. `parent` or `father`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationName(String);

impl RelationName {
    /// Validate `name` as an atomic identifier
    pub fn new(name: impl Into<String>) -> Result<Self, RelationError> {
        let name = name.into();
        if IDENTIFIER.is_match(&name) {
            Ok(Self(name))
        } else {
            Err(RelationError::Configuration(format!(
                "relation name must be an identifier, got {:?}",
                name
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RelationName {
    fn default() -> Self {
        Self(DEFAULT_RELATION_NAME.to_string())
    }
}

impl fmt::Display for RelationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for RelationName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RelationName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Options for [`ModelBuilder::include_relations`](crate::ModelBuilder::include_relations)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RelationOptions {
    /// Relation name; `parent` when absent
    #[serde(default, rename = "as")]
    pub as_name: Option<String>,
}

impl RelationOptions {
    /// Options with an explicit relation name (`as: :father`)
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            as_name: Some(name.into()),
        }
    }

    /// The validated relation name
    pub fn relation_name(&self) -> Result<RelationName, RelationError> {
        match &self.as_name {
            Some(name) => RelationName::new(name.as_str()),
            None => Ok(RelationName::default()),
        }
    }
}
