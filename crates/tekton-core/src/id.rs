//! Resource identity in `<namespace>/<name>` form.
//!
//! The identity is built once when an object is created and stored by the
//! host as the primary key of its configuration. Every later read, update,
//! delete or existence check parses it back before touching the store.

use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};
use crate::meta::ObjectMeta;

pub const SEPARATOR: char = '/';

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectId {
    pub namespace: String,
    pub name: String,
}

impl ObjectId {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Builds the identity of an object from its metadata.
    pub fn from_meta(meta: &ObjectMeta) -> Result<Self> {
        if meta.namespace.is_empty() {
            return Err(CoreError::missing_metadata("namespace"));
        }
        if meta.name.is_empty() {
            return Err(CoreError::missing_metadata("name"));
        }
        Ok(Self::new(meta.namespace.clone(), meta.name.clone()))
    }

    /// Parses `<namespace>/<name>`. Both parts must be non-empty and the
    /// separator must appear exactly once.
    pub fn parse(id: &str) -> Result<Self> {
        let (namespace, name) = id
            .split_once(SEPARATOR)
            .ok_or_else(|| CoreError::invalid_identity(id, "expected <namespace>/<name>"))?;
        if namespace.is_empty() {
            return Err(CoreError::invalid_identity(id, "namespace is empty"));
        }
        if name.is_empty() {
            return Err(CoreError::invalid_identity(id, "name is empty"));
        }
        if name.contains(SEPARATOR) {
            return Err(CoreError::invalid_identity(id, "name contains a separator"));
        }
        Ok(Self::new(namespace, name))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.namespace, self.name)
    }
}

impl FromStr for ObjectId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Builds the `<namespace>/<name>` identity string.
pub fn build_id(namespace: &str, name: &str) -> String {
    ObjectId::new(namespace, name).to_string()
}
