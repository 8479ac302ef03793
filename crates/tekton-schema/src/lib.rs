//! Tekton domain kinds and the transform between them and the flat
//! configuration tree a host orchestrator speaks.
//!
//! - [`fields::expand`] turns a tree into a typed object
//! - [`fields::flatten`] turns a typed object back into a tree
//! - [`patch::diff`] compares two snapshots and yields a JSON Patch
//! - [`declaration::validate`] checks a tree against the static field declarations

pub mod declaration;
pub mod error;
pub mod fields;
pub mod kinds;
pub mod meta;
pub mod patch;
pub mod tree;

pub use declaration::{Declared, Field, FieldType, validate};
pub use error::SchemaError;
pub use fields::{ConfigBlock, EnumValue, FieldReader, FieldWriter, expand, flatten};
pub use kinds::common::{Condition, ConditionStatus, Param, ParamSpec, ParamType, ParamValue};
pub use kinds::pipeline::{Pipeline, PipelineSpec, PipelineTask, WhenExpression, WhenOperator};
pub use kinds::pipeline_run::{
    PipelineRun, PipelineRunSpec, PipelineRunSpecStatus, PipelineRunStatus, PodTemplate,
};
pub use kinds::task::{Step, Task, TaskSpec};
pub use kinds::task_run::{TaskRun, TaskRunSpec, TaskRunSpecStatus, TaskRunStatus, WorkspaceBinding};
pub use patch::{PatchOp, PatchOperation, PatchOperations, diff, diff_trees};
pub use tree::{ConfigMap, ConfigValue, FieldPath};

use tekton_core::Resource;

/// Everything the reconciler needs from a kind: wire identity, tree
/// transform and field declarations.
pub trait Kind: Resource + ConfigBlock + Declared {}

impl<T: Resource + ConfigBlock + Declared> Kind for T {}
