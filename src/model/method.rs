//! Per-model method table.
//!
//! Writers are registered as `"<attribute>="`; user methods (for example lazy
//! default producers) under their own name. The relation engine decorates
//! entries in this table once, while the model is being built.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::model::{ModelError, ModelResult, Object, Visibility};
use crate::value::Value;

/// Method body: receives the instance and the call arguments
pub type MethodFn = Arc<dyn Fn(&Object, &[Value]) -> ModelResult<Value> + Send + Sync>;

/// A callable entry in a [`MethodTable`]
#[derive(Clone)]
pub struct Method {
    visibility: Visibility,
    arity: usize,
    body: MethodFn,
}

impl Method {
    /// Create a public method taking `arity` arguments
    pub fn new<F>(arity: usize, body: F) -> Self
    where
        F: Fn(&Object, &[Value]) -> ModelResult<Value> + Send + Sync + 'static,
    {
        Self {
            visibility: Visibility::Public,
            arity,
            body: Arc::new(body),
        }
    }

    #[must_use]
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Invoke the body after checking the argument count
    pub fn invoke(&self, name: &str, receiver: &Object, args: &[Value]) -> ModelResult<Value> {
        if args.len() != self.arity {
            return Err(ModelError::Arity {
                method: name.to_string(),
                expected: self.arity,
                actual: args.len(),
            });
        }
        (self.body)(receiver, args)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("visibility", &self.visibility)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Name → method map owned by a model
#[derive(Debug, Clone, Default)]
pub struct MethodTable {
    methods: HashMap<String, Method>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define or redefine `name`
    pub fn define(&mut self, name: impl Into<String>, method: Method) {
        self.methods.insert(name.into(), method);
    }

    pub fn get(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn visibility_of(&self, name: &str) -> Option<Visibility> {
        self.methods.get(name).map(Method::visibility)
    }

    /// Copy the current body of `existing` under `alias` with the given visibility.
    /// Returns `false` when `existing` is not defined.
    pub fn alias(&mut self, alias: impl Into<String>, existing: &str, visibility: Visibility) -> bool {
        match self.methods.get(existing).cloned() {
            Some(method) => {
                self.methods.insert(alias.into(), method.with_visibility(visibility));
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }
}
