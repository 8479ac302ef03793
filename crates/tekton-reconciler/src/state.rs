//! Lifecycle phases observed while polling the store.

use std::fmt;

use tekton_core::Readiness;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Submitted but not visible, or visible and not yet terminal.
    Creating,
    Succeeded,
    /// Deletion accepted, object still readable.
    Deleting,
    Deleted,
    Failed,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Creating => "Creating",
            Self::Succeeded => "Succeeded",
            Self::Deleting => "Deleting",
            Self::Deleted => "Deleted",
            Self::Failed => "Failed",
        }
    }

    /// Maps what an object says about itself onto the create lifecycle.
    pub fn from_readiness(readiness: &Readiness) -> Self {
        match readiness {
            Readiness::Ready => Self::Succeeded,
            Readiness::Pending => Self::Creating,
            Readiness::Failed { .. } => Self::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Deleted | Self::Failed)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_readiness() {
        assert_eq!(
            LifecycleState::from_readiness(&Readiness::Ready),
            LifecycleState::Succeeded
        );
        assert_eq!(
            LifecycleState::from_readiness(&Readiness::Pending),
            LifecycleState::Creating
        );
        let failed = Readiness::Failed {
            reason: "TaskRunImagePullFailed".into(),
            message: "image not found".into(),
        };
        assert_eq!(LifecycleState::from_readiness(&failed), LifecycleState::Failed);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!LifecycleState::Creating.is_terminal());
        assert!(!LifecycleState::Deleting.is_terminal());
        assert!(LifecycleState::Deleted.is_terminal());
        assert_eq!(LifecycleState::Deleting.to_string(), "Deleting");
    }
}
