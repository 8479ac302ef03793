//! Static field declarations for every kind, and validation of a tree
//! against them.
//!
//! Validation runs before [`expand`](crate::fields::expand) and is stricter:
//! it rejects keys that no declaration names, besides the shape, closed-set
//! and required-leaf checks that expand also performs.

use crate::error::SchemaError;
use crate::fields::{EnumValue, Result};
use crate::kinds::common::{ConditionStatus, ParamType};
use crate::kinds::pipeline::{Pipeline, WhenOperator};
use crate::kinds::pipeline_run::{DnsPolicy, PipelineRun, PipelineRunSpecStatus};
use crate::kinds::task::Task;
use crate::kinds::task_run::{TaskRun, TaskRunSpecStatus};
use crate::tree::{ConfigMap, ConfigValue, FieldPath};

#[derive(Debug, Clone, Copy)]
pub enum FieldType {
    String,
    Bool,
    Int,
    StringList,
    StringMap,
    Enum(&'static [&'static str]),
    Block(&'static [Field]),
    BlockList(&'static [Field]),
    BlockMap(&'static [Field]),
}

impl FieldType {
    fn shape(&self) -> &'static str {
        match self {
            Self::String | Self::Enum(_) => "string",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::StringList | Self::BlockList(_) => "list",
            Self::StringMap | Self::Block(_) | Self::BlockMap(_) => "map",
        }
    }
}

/// One declared field.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
    pub required: bool,
    /// Populated by the store; accepted on input, never required.
    pub computed: bool,
}

impl Field {
    pub const fn optional(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            required: false,
            computed: false,
        }
    }

    pub const fn required(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            required: true,
            computed: false,
        }
    }

    pub const fn computed(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            required: false,
            computed: true,
        }
    }
}

/// A kind with a static field declaration.
pub trait Declared {
    const FIELDS: &'static [Field];
}

use FieldType::{Block, BlockList, BlockMap, Bool, Enum, Int, StringList, StringMap};

const STRING: FieldType = FieldType::String;
const PARAM_TYPES: FieldType = Enum(ParamType::ALLOWED);

const METADATA: &[Field] = &[
    Field::optional("name", STRING),
    Field::optional("generate_name", STRING),
    Field::optional("namespace", STRING),
    Field::optional("labels", StringMap),
    Field::optional("annotations", StringMap),
    Field::computed("uid", STRING),
    Field::computed("resource_version", STRING),
    Field::computed("generation", Int),
    Field::computed("creation_timestamp", STRING),
];

const PARAM_VALUE: &[Field] = &[
    Field::optional("type", PARAM_TYPES),
    Field::optional("string_val", STRING),
    Field::optional("array_val", StringList),
    Field::optional("object_val", StringMap),
];

const PROPERTY_SPEC: &[Field] = &[Field::optional("type", PARAM_TYPES)];

const PARAM_SPEC: &[Field] = &[
    Field::required("name", STRING),
    Field::optional("type", PARAM_TYPES),
    Field::optional("description", STRING),
    Field::optional("properties", BlockMap(PROPERTY_SPEC)),
    Field::optional("default", Block(PARAM_VALUE)),
];

const PARAM: &[Field] = &[
    Field::required("name", STRING),
    Field::required("value", Block(PARAM_VALUE)),
];

const ENV_VAR: &[Field] = &[Field::required("name", STRING), Field::optional("value", STRING)];

const VOLUME_MOUNT: &[Field] = &[
    Field::required("name", STRING),
    Field::required("mount_path", STRING),
    Field::optional("read_only", Bool),
    Field::optional("sub_path", STRING),
];

const WORKSPACE_USAGE: &[Field] = &[
    Field::required("name", STRING),
    Field::optional("mount_path", STRING),
];

const STEP: &[Field] = &[
    Field::required("name", STRING),
    Field::optional("image", STRING),
    Field::optional("command", StringList),
    Field::optional("args", StringList),
    Field::optional("working_dir", STRING),
    Field::optional("env", BlockList(ENV_VAR)),
    Field::optional("volume_mounts", BlockList(VOLUME_MOUNT)),
    Field::optional("image_pull_policy", STRING),
    Field::optional("script", STRING),
    Field::optional("timeout", STRING),
    Field::optional("workspaces", BlockList(WORKSPACE_USAGE)),
    Field::optional("on_error", STRING),
];

const STEP_TEMPLATE: &[Field] = &[
    Field::optional("image", STRING),
    Field::optional("command", StringList),
    Field::optional("args", StringList),
    Field::optional("working_dir", STRING),
    Field::optional("env", BlockList(ENV_VAR)),
    Field::optional("volume_mounts", BlockList(VOLUME_MOUNT)),
    Field::optional("image_pull_policy", STRING),
];

const SIDECAR: &[Field] = &[
    Field::required("name", STRING),
    Field::optional("image", STRING),
    Field::optional("command", StringList),
    Field::optional("args", StringList),
    Field::optional("working_dir", STRING),
    Field::optional("env", BlockList(ENV_VAR)),
    Field::optional("volume_mounts", BlockList(VOLUME_MOUNT)),
    Field::optional("script", STRING),
];

const WORKSPACE_DECLARATION: &[Field] = &[
    Field::required("name", STRING),
    Field::optional("description", STRING),
    Field::optional("mount_path", STRING),
    Field::optional("read_only", Bool),
    Field::optional("optional", Bool),
];

const TASK_RESULT: &[Field] = &[
    Field::required("name", STRING),
    Field::optional("type", PARAM_TYPES),
    Field::optional("description", STRING),
];

const TASK_SPEC: &[Field] = &[
    Field::optional("display_name", STRING),
    Field::optional("description", STRING),
    Field::optional("params", BlockList(PARAM_SPEC)),
    Field::optional("steps", BlockList(STEP)),
    Field::optional("step_template", Block(STEP_TEMPLATE)),
    Field::optional("sidecars", BlockList(SIDECAR)),
    Field::optional("workspaces", BlockList(WORKSPACE_DECLARATION)),
    Field::optional("results", BlockList(TASK_RESULT)),
];

const CONDITION: &[Field] = &[
    Field::required("type", STRING),
    Field::required("status", Enum(ConditionStatus::ALLOWED)),
    Field::optional("reason", STRING),
    Field::optional("message", STRING),
    Field::optional("last_transition_time", STRING),
];

const TASK_REF: &[Field] = &[
    Field::required("name", STRING),
    Field::optional("kind", STRING),
    Field::optional("api_version", STRING),
];

const EMPTY_DIR: &[Field] = &[Field::optional("medium", STRING)];

const PERSISTENT_VOLUME_CLAIM: &[Field] = &[
    Field::required("claim_name", STRING),
    Field::optional("read_only", Bool),
];

const CONFIG_MAP_SOURCE: &[Field] = &[Field::required("name", STRING)];

const SECRET_SOURCE: &[Field] = &[Field::required("secret_name", STRING)];

const WORKSPACE_BINDING: &[Field] = &[
    Field::required("name", STRING),
    Field::optional("sub_path", STRING),
    Field::optional("empty_dir", Block(EMPTY_DIR)),
    Field::optional("persistent_volume_claim", Block(PERSISTENT_VOLUME_CLAIM)),
    Field::optional("config_map", Block(CONFIG_MAP_SOURCE)),
    Field::optional("secret", Block(SECRET_SOURCE)),
];

const TASK_RUN_SPEC: &[Field] = &[
    Field::optional("task_ref", Block(TASK_REF)),
    Field::optional("task_spec", Block(TASK_SPEC)),
    Field::optional("params", BlockList(PARAM)),
    Field::optional("service_account_name", STRING),
    Field::optional("timeout", STRING),
    Field::optional("workspaces", BlockList(WORKSPACE_BINDING)),
    Field::optional("status", Enum(TaskRunSpecStatus::ALLOWED)),
];

const TASK_RUN_RESULT: &[Field] = &[
    Field::required("name", STRING),
    Field::optional("type", PARAM_TYPES),
    Field::optional("value", Block(PARAM_VALUE)),
];

const TASK_RUN_STATUS: &[Field] = &[
    Field::computed("conditions", BlockList(CONDITION)),
    Field::computed("pod_name", STRING),
    Field::computed("start_time", STRING),
    Field::computed("completion_time", STRING),
    Field::computed("results", BlockList(TASK_RUN_RESULT)),
    Field::computed("task_spec", Block(TASK_SPEC)),
];

const WHEN_EXPRESSION: &[Field] = &[
    Field::optional("input", STRING),
    Field::required("operator", Enum(WhenOperator::ALLOWED)),
    Field::optional("values", StringList),
];

const PIPELINE_TASK_WORKSPACE: &[Field] = &[
    Field::required("name", STRING),
    Field::optional("workspace", STRING),
    Field::optional("sub_path", STRING),
];

const PIPELINE_TASK: &[Field] = &[
    Field::required("name", STRING),
    Field::optional("display_name", STRING),
    Field::optional("task_ref", Block(TASK_REF)),
    Field::optional("task_spec", Block(TASK_SPEC)),
    Field::optional("run_after", StringList),
    Field::optional("params", BlockList(PARAM)),
    Field::optional("workspaces", BlockList(PIPELINE_TASK_WORKSPACE)),
    Field::optional("when", BlockList(WHEN_EXPRESSION)),
    Field::optional("retries", Int),
    Field::optional("timeout", STRING),
];

const PIPELINE_WORKSPACE: &[Field] = &[
    Field::required("name", STRING),
    Field::optional("description", STRING),
    Field::optional("optional", Bool),
];

const PIPELINE_RESULT: &[Field] = &[
    Field::required("name", STRING),
    Field::optional("type", PARAM_TYPES),
    Field::optional("description", STRING),
    Field::optional("value", Block(PARAM_VALUE)),
];

const PIPELINE_SPEC: &[Field] = &[
    Field::optional("display_name", STRING),
    Field::optional("description", STRING),
    Field::optional("params", BlockList(PARAM_SPEC)),
    Field::optional("tasks", BlockList(PIPELINE_TASK)),
    Field::optional("finally", BlockList(PIPELINE_TASK)),
    Field::optional("workspaces", BlockList(PIPELINE_WORKSPACE)),
    Field::optional("results", BlockList(PIPELINE_RESULT)),
];

const PIPELINE_REF: &[Field] = &[
    Field::required("name", STRING),
    Field::optional("api_version", STRING),
];

const TIMEOUTS: &[Field] = &[
    Field::optional("pipeline", STRING),
    Field::optional("tasks", STRING),
    Field::optional("finally", STRING),
];

const LOCAL_OBJECT_REFERENCE: &[Field] = &[Field::required("name", STRING)];

const POD_TEMPLATE: &[Field] = &[
    Field::optional("node_selector", StringMap),
    Field::optional("env", BlockList(ENV_VAR)),
    Field::optional("image_pull_secrets", BlockList(LOCAL_OBJECT_REFERENCE)),
    Field::optional("scheduler_name", STRING),
    Field::optional("priority_class_name", STRING),
    Field::optional("runtime_class_name", STRING),
    Field::optional("host_network", Bool),
    Field::optional("dns_policy", Enum(DnsPolicy::ALLOWED)),
];

const TASK_RUN_TEMPLATE: &[Field] = &[
    Field::optional("pod_template", Block(POD_TEMPLATE)),
    Field::optional("service_account_name", STRING),
];

const PIPELINE_RUN_SPEC: &[Field] = &[
    Field::optional("pipeline_ref", Block(PIPELINE_REF)),
    Field::optional("pipeline_spec", Block(PIPELINE_SPEC)),
    Field::optional("params", BlockList(PARAM)),
    Field::optional("status", Enum(PipelineRunSpecStatus::ALLOWED)),
    Field::optional("timeouts", Block(TIMEOUTS)),
    Field::optional("task_run_template", Block(TASK_RUN_TEMPLATE)),
    Field::optional("workspaces", BlockList(WORKSPACE_BINDING)),
];

const PIPELINE_RUN_RESULT: &[Field] = &[
    Field::required("name", STRING),
    Field::optional("value", Block(PARAM_VALUE)),
];

const SKIPPED_TASK: &[Field] = &[
    Field::required("name", STRING),
    Field::optional("reason", STRING),
    Field::optional("when_expressions", BlockList(WHEN_EXPRESSION)),
];

const CHILD_REFERENCE: &[Field] = &[
    Field::required("name", STRING),
    Field::optional("pipeline_task_name", STRING),
    Field::optional("kind", STRING),
    Field::optional("api_version", STRING),
    Field::optional("when_expressions", BlockList(WHEN_EXPRESSION)),
];

const PIPELINE_RUN_STATUS: &[Field] = &[
    Field::computed("conditions", BlockList(CONDITION)),
    Field::computed("start_time", STRING),
    Field::computed("completion_time", STRING),
    Field::computed("finally_start_time", STRING),
    Field::computed("results", BlockList(PIPELINE_RUN_RESULT)),
    Field::computed("skipped_tasks", BlockList(SKIPPED_TASK)),
    Field::computed("child_references", BlockList(CHILD_REFERENCE)),
    Field::computed("pipeline_spec", Block(PIPELINE_SPEC)),
];

impl Declared for Task {
    const FIELDS: &'static [Field] = &[
        Field::optional("metadata", Block(METADATA)),
        Field::optional("spec", Block(TASK_SPEC)),
    ];
}

impl Declared for TaskRun {
    const FIELDS: &'static [Field] = &[
        Field::optional("metadata", Block(METADATA)),
        Field::optional("spec", Block(TASK_RUN_SPEC)),
        Field::computed("status", Block(TASK_RUN_STATUS)),
    ];
}

impl Declared for Pipeline {
    const FIELDS: &'static [Field] = &[
        Field::optional("metadata", Block(METADATA)),
        Field::optional("spec", Block(PIPELINE_SPEC)),
    ];
}

impl Declared for PipelineRun {
    const FIELDS: &'static [Field] = &[
        Field::optional("metadata", Block(METADATA)),
        Field::optional("spec", Block(PIPELINE_RUN_SPEC)),
        Field::computed("status", Block(PIPELINE_RUN_STATUS)),
    ];
}

/// Checks `tree` against the declaration of `R`.
pub fn validate<R: Declared>(tree: &ConfigMap) -> Result<()> {
    validate_map(tree, R::FIELDS, &FieldPath::root())
}

/// Checks one map against `fields`, returning the first violation.
pub fn validate_map(map: &ConfigMap, fields: &[Field], path: &FieldPath) -> Result<()> {
    for key in map.keys() {
        if !fields.iter().any(|f| f.name == key) {
            return Err(SchemaError::unknown_field(path.join(key)));
        }
    }
    for field in fields {
        let field_path = path.join(field.name);
        match map.get(field.name).filter(|v| !v.is_null()) {
            Some(value) => validate_value(value, &field.ty, &field_path)?,
            None if field.required && !field.computed => {
                return Err(SchemaError::missing_field(field_path));
            }
            None => {}
        }
    }
    Ok(())
}

fn validate_value(value: &ConfigValue, ty: &FieldType, path: &FieldPath) -> Result<()> {
    let mismatch = || SchemaError::type_mismatch(path, ty.shape());
    match (ty, value) {
        (FieldType::String, ConfigValue::String(_))
        | (FieldType::Bool, ConfigValue::Bool(_))
        | (FieldType::Int, ConfigValue::Int(_)) => Ok(()),
        (FieldType::Enum(allowed), ConfigValue::String(s)) => {
            if s.is_empty() || allowed.contains(&s.as_str()) {
                Ok(())
            } else {
                Err(SchemaError::invalid_value(path, s.clone(), allowed))
            }
        }
        (FieldType::StringList, ConfigValue::List(items)) => {
            for (i, item) in items.iter().enumerate() {
                if !matches!(item, ConfigValue::String(_)) {
                    return Err(SchemaError::type_mismatch(path.join(i), "string"));
                }
            }
            Ok(())
        }
        (FieldType::StringMap, ConfigValue::Map(entries)) => {
            for (key, item) in entries {
                if !matches!(item, ConfigValue::String(_)) {
                    return Err(SchemaError::type_mismatch(path.join(key), "string"));
                }
            }
            Ok(())
        }
        (FieldType::Block(fields), ConfigValue::Map(map)) => validate_map(map, fields, path),
        (FieldType::BlockList(fields), ConfigValue::List(items)) => {
            for (i, item) in items.iter().enumerate() {
                let item_path = path.join(i);
                match item {
                    ConfigValue::Map(map) => validate_map(map, fields, &item_path)?,
                    _ => return Err(SchemaError::type_mismatch(item_path, "map")),
                }
            }
            Ok(())
        }
        (FieldType::BlockMap(fields), ConfigValue::Map(entries)) => {
            for (key, item) in entries {
                let item_path = path.join(key);
                match item {
                    ConfigValue::Map(map) => validate_map(map, fields, &item_path)?,
                    _ => return Err(SchemaError::type_mismatch(item_path, "map")),
                }
            }
            Ok(())
        }
        _ => Err(mismatch()),
    }
}
