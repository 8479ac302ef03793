//! Errors returned by reconciliation operations.
//!
//! Every failure below the engine is wrapped with the kind, namespace, name
//! and operation it happened in.

use std::fmt;
use std::time::Duration;

use tekton_core::CoreError;
use tekton_schema::SchemaError;
use tekton_storage::StoreError;

use crate::state::LifecycleState;

/// The engine operation an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    Exists,
    Import,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Exists => "exists",
            Self::Import => "import",
        };
        f.write_str(name)
    }
}

/// Kind and address of the object an operation targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub kind: &'static str,
    pub namespace: String,
    pub name: String,
}

impl ObjectRef {
    pub fn new(kind: &'static str, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{} in {}", self.kind, self.namespace)
        } else {
            write!(f, "{} {}/{}", self.kind, self.namespace, self.name)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("{operation} {object}: {source}")]
    Store {
        object: ObjectRef,
        operation: Operation,
        #[source]
        source: StoreError,
    },

    #[error("{operation} {kind}: invalid configuration: {source}")]
    Schema {
        kind: &'static str,
        operation: Operation,
        #[source]
        source: SchemaError,
    },

    #[error("{0}")]
    Parse(#[from] CoreError),

    #[error("{operation} {object}: timed out after {}s waiting for {target}", .timeout.as_secs())]
    Timeout {
        object: ObjectRef,
        operation: Operation,
        target: String,
        timeout: Duration,
    },

    #[error("{object} failed: {reason}: {message}")]
    Failed {
        object: ObjectRef,
        reason: String,
        message: String,
    },

    #[error("{operation} {object}: unexpected state {state}")]
    UnexpectedState {
        object: ObjectRef,
        operation: Operation,
        state: LifecycleState,
    },

    #[error("{operation} {object}: cancelled")]
    Cancelled {
        object: ObjectRef,
        operation: Operation,
    },
}

impl ReconcileError {
    pub fn store(object: &ObjectRef, operation: Operation, source: StoreError) -> Self {
        Self::Store {
            object: object.clone(),
            operation,
            source,
        }
    }

    pub fn schema(kind: &'static str, operation: Operation, source: SchemaError) -> Self {
        Self::Schema {
            kind,
            operation,
            source,
        }
    }

    pub fn failed(
        object: &ObjectRef,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Failed {
            object: object.clone(),
            reason: reason.into(),
            message: message.into(),
        }
    }

    /// The store reported the object absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store { source, .. } if source.is_not_found())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Parse(e) if e.is_parse_error())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Store { source, .. } => match source.category() {
                tekton_storage::ErrorCategory::NotFound => ErrorCategory::NotFound,
                tekton_storage::ErrorCategory::Conflict => ErrorCategory::Conflict,
                tekton_storage::ErrorCategory::Rejected => ErrorCategory::Rejected,
                tekton_storage::ErrorCategory::Infrastructure => ErrorCategory::Infrastructure,
                tekton_storage::ErrorCategory::Serialization => ErrorCategory::Serialization,
            },
            Self::Schema { .. } => ErrorCategory::Validation,
            Self::Parse(_) => ErrorCategory::Parse,
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::Failed { .. } | Self::UnexpectedState { .. } => ErrorCategory::Failed,
            Self::Cancelled { .. } => ErrorCategory::Cancelled,
        }
    }
}

/// Error categories for logging and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    NotFound,
    Conflict,
    Rejected,
    Infrastructure,
    Serialization,
    Validation,
    Parse,
    Timeout,
    Failed,
    Cancelled,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Rejected => write!(f, "rejected"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Serialization => write!(f, "serialization"),
            Self::Validation => write!(f, "validation"),
            Self::Parse => write!(f, "parse"),
            Self::Timeout => write!(f, "timeout"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReconcileError>;

#[cfg(test)]
mod tests {
    use super::*;
    use tekton_core::{GroupVersionResource, ResourceCoordinate};

    fn build() -> ObjectRef {
        ObjectRef::new("TaskRun", "ci", "build-1")
    }

    #[test]
    fn test_store_error_carries_context() {
        let coordinate = ResourceCoordinate::new(
            GroupVersionResource::new("tekton.dev", "v1alpha1", "taskruns"),
            "ci",
            "build-1",
        );
        let err = ReconcileError::store(&build(), Operation::Read, StoreError::not_found(&coordinate));
        assert_eq!(
            err.to_string(),
            "read TaskRun ci/build-1: Resource not found: taskruns ci/build-1"
        );
        assert!(err.is_not_found());
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_timeout_display() {
        let err = ReconcileError::Timeout {
            object: build(),
            operation: Operation::Create,
            target: "Succeeded".into(),
            timeout: Duration::from_secs(2400),
        };
        assert_eq!(
            err.to_string(),
            "create TaskRun ci/build-1: timed out after 2400s waiting for Succeeded"
        );
        assert!(err.is_timeout());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_failed_display() {
        let err = ReconcileError::failed(&build(), "TaskRunImagePullFailed", "image not found");
        assert_eq!(
            err.to_string(),
            "TaskRun ci/build-1 failed: TaskRunImagePullFailed: image not found"
        );
        assert_eq!(err.category().to_string(), "failed");
    }

    #[test]
    fn test_parse_error_conversion() {
        let err: ReconcileError = CoreError::invalid_identity("nope", "expected <namespace>/<name>").into();
        assert!(err.is_parse_error());
        assert_eq!(err.category(), ErrorCategory::Parse);
    }

    #[test]
    fn test_object_ref_without_name() {
        assert_eq!(ObjectRef::new("Task", "ci", "").to_string(), "Task in ci");
    }
}
