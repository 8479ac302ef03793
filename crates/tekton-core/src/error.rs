use thiserror::Error;

/// Core error types shared by the reconciler crates
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid resource identity \"{id}\": {reason}")]
    InvalidIdentity { id: String, reason: &'static str },

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Object metadata is missing a {field}")]
    MissingMetadata { field: &'static str },

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CoreError {
    /// Create a new InvalidIdentity error
    pub fn invalid_identity(id: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidIdentity {
            id: id.into(),
            reason,
        }
    }

    /// Create a new InvalidTimestamp error
    pub fn invalid_timestamp(value: impl Into<String>) -> Self {
        Self::InvalidTimestamp(value.into())
    }

    /// Create a new MissingMetadata error
    pub fn missing_metadata(field: &'static str) -> Self {
        Self::MissingMetadata { field }
    }

    /// Check if this error was raised while parsing an identity string
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::InvalidIdentity { .. })
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidIdentity { .. } => ErrorCategory::Parse,
            Self::InvalidTimestamp(_) | Self::MissingMetadata { .. } => ErrorCategory::Validation,
            Self::JsonError(_) => ErrorCategory::Serialization,
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Parse,
    Validation,
    Serialization,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse => write!(f, "parse"),
            Self::Validation => write!(f, "validation"),
            Self::Serialization => write!(f, "serialization"),
        }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_identity_error() {
        let err = CoreError::invalid_identity("default", "missing separator");
        assert_eq!(
            err.to_string(),
            "Invalid resource identity \"default\": missing separator"
        );
        assert!(err.is_parse_error());
        assert_eq!(err.category(), ErrorCategory::Parse);
    }

    #[test]
    fn test_missing_metadata_error() {
        let err = CoreError::missing_metadata("name");
        assert_eq!(err.to_string(), "Object metadata is missing a name");
        assert!(!err.is_parse_error());
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err: serde_json::Error =
            serde_json::from_str::<serde_json::Value>("{ invalid json }").unwrap_err();
        let core_err: CoreError = json_err.into();

        assert!(matches!(core_err, CoreError::JsonError(_)));
        assert_eq!(core_err.category(), ErrorCategory::Serialization);
    }

    #[test]
    fn test_error_categories_display() {
        assert_eq!(ErrorCategory::Parse.to_string(), "parse");
        assert_eq!(ErrorCategory::Validation.to_string(), "validation");
        assert_eq!(ErrorCategory::Serialization.to_string(), "serialization");
    }
}
