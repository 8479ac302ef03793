//! The four Tekton kinds and their building blocks.

pub mod common;
pub mod pipeline;
pub mod pipeline_run;
pub mod task;
pub mod task_run;

use tekton_core::Readiness;

use self::common::{ConditionStatus, Condition, succeeded_condition};

/// API group shared by every kind in this module.
pub const GROUP: &str = "tekton.dev";

/// Maps the `Succeeded` condition of a run onto [`Readiness`].
pub(crate) fn readiness_from_conditions(conditions: Option<&[Condition]>) -> Readiness {
    let Some(condition) = conditions.and_then(succeeded_condition) else {
        return Readiness::Pending;
    };
    match condition.status {
        ConditionStatus::True => Readiness::Ready,
        ConditionStatus::False => Readiness::Failed {
            reason: condition.reason.clone(),
            message: condition.message.clone(),
        },
        ConditionStatus::Unknown => Readiness::Pending,
    }
}
