//! Errors returned by resource store backends and the typed client.

use std::fmt;

use tekton_core::ResourceCoordinate;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The addressed object does not exist.
    #[error("Resource not found: {resource} {namespace}/{name}")]
    NotFound {
        resource: String,
        namespace: String,
        name: String,
    },

    /// The request never produced a verdict on the object: transport,
    /// authentication or an unreadable response.
    #[error("Client error: {message}")]
    Client { message: String },

    /// The server rejected the request.
    #[error("Request rejected (HTTP {status}): {message}")]
    Request { status: u16, message: String },

    /// Encoding or decoding an object failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    #[must_use]
    pub fn not_found(coordinate: &ResourceCoordinate) -> Self {
        Self::NotFound {
            resource: coordinate.gvr.resource.clone(),
            namespace: coordinate.namespace.clone(),
            name: coordinate.name.clone(),
        }
    }

    #[must_use]
    pub fn client(message: impl Into<String>) -> Self {
        Self::Client {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn request(status: u16, message: impl Into<String>) -> Self {
        Self::Request {
            status,
            message: message.into(),
        }
    }

    /// Returns `true` if the addressed object does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if the server answered with a rejection.
    #[must_use]
    pub fn is_request_error(&self) -> bool {
        matches!(self, Self::Request { .. })
    }

    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Client { .. } => ErrorCategory::Infrastructure,
            Self::Request { status: 409, .. } => ErrorCategory::Conflict,
            Self::Request { .. } => ErrorCategory::Rejected,
            Self::Serialization(_) => ErrorCategory::Serialization,
        }
    }
}

/// Categories of store errors for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    NotFound,
    Conflict,
    Rejected,
    Infrastructure,
    Serialization,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Rejected => write!(f, "rejected"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Serialization => write!(f, "serialization"),
        }
    }
}
