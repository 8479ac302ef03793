//! Errors raised by the schema transform and the schema declarations.

use std::fmt;

/// Errors that can occur while expanding, validating or diffing a
/// configuration tree.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A required leaf is absent from an otherwise well-typed tree.
    #[error("Missing required field: {path}")]
    MissingField {
        /// Dotted path of the missing field.
        path: String,
    },

    /// A leaf has a different shape than its declaration.
    #[error("Type mismatch at {path}: expected {expected}")]
    TypeMismatch {
        /// Dotted path of the offending field.
        path: String,
        /// Human readable name of the declared shape.
        expected: &'static str,
    },

    /// An enumerated leaf holds a value outside its closed set.
    #[error("Invalid value \"{value}\" at {path}; expected one of: {}", .allowed.join(", "))]
    InvalidValue {
        /// Dotted path of the offending field.
        path: String,
        /// The rejected value.
        value: String,
        /// The closed set of accepted values.
        allowed: Vec<&'static str>,
    },

    /// A key that the schema does not declare.
    #[error("Unknown field: {path}")]
    UnknownField {
        /// Dotted path of the undeclared field.
        path: String,
    },

    /// Encoding a domain object or a patch document failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SchemaError {
    /// Creates a new `MissingField` error.
    #[must_use]
    pub fn missing_field(path: impl fmt::Display) -> Self {
        Self::MissingField {
            path: path.to_string(),
        }
    }

    /// Creates a new `TypeMismatch` error.
    #[must_use]
    pub fn type_mismatch(path: impl fmt::Display, expected: &'static str) -> Self {
        Self::TypeMismatch {
            path: path.to_string(),
            expected,
        }
    }

    /// Creates a new `InvalidValue` error.
    #[must_use]
    pub fn invalid_value(
        path: impl fmt::Display,
        value: impl Into<String>,
        allowed: &[&'static str],
    ) -> Self {
        Self::InvalidValue {
            path: path.to_string(),
            value: value.into(),
            allowed: allowed.to_vec(),
        }
    }

    /// Creates a new `UnknownField` error.
    #[must_use]
    pub fn unknown_field(path: impl fmt::Display) -> Self {
        Self::UnknownField {
            path: path.to_string(),
        }
    }

    /// Returns `true` if a required leaf was absent.
    #[must_use]
    pub fn is_missing_field(&self) -> bool {
        matches!(self, Self::MissingField { .. })
    }
}
