use serde::{Deserialize, Serialize};
use tekton_core::{ObjectMeta, Resource, TypeMeta};

use super::common::{Param, ParamSpec, ParamType, ParamValue};
use super::task::TaskSpec;
use super::task_run::TaskRef;
use crate::fields::{ConfigBlock, FieldReader, FieldWriter, Result};
use crate::string_enum;
use crate::tree::ConfigMap;

string_enum! {
    /// Relationship between a `when` input and its values.
    pub enum WhenOperator {
        Not => "!",
        Assign => "=",
        Equals => "==",
        In => "in",
        NotEquals => "!=",
        NotIn => "notin",
        Exists => "exists",
        GreaterThan => "gt",
        LessThan => "lt",
    }
}

/// Guard deciding whether a pipeline task runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhenExpression {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub input: String,
    pub operator: WhenOperator,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

impl ConfigBlock for WhenExpression {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            input: fields.string("input")?,
            operator: fields.required_enumerated("operator")?,
            values: fields.strings("values")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .string("input", &self.input)
            .enumerated("operator", Some(self.operator))
            .strings("values", &self.values)
            .finish()
    }
}

/// Maps a pipeline workspace onto a task workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspacePipelineTaskBinding {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub workspace: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sub_path: String,
}

impl ConfigBlock for WorkspacePipelineTaskBinding {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.required_string("name")?,
            workspace: fields.string("workspace")?,
            sub_path: fields.string("sub_path")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .string("name", &self.name)
            .string("workspace", &self.workspace)
            .string("sub_path", &self.sub_path)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineTask {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_ref: Option<TaskRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_spec: Option<TaskSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub run_after: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workspaces: Vec<WorkspacePipelineTaskBinding>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub when: Vec<WhenExpression>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub retries: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub timeout: String,
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}

impl ConfigBlock for PipelineTask {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.required_string("name")?,
            display_name: fields.string("display_name")?,
            task_ref: fields.block("task_ref")?,
            task_spec: fields.block("task_spec")?,
            run_after: fields.strings("run_after")?,
            params: fields.blocks("params")?,
            workspaces: fields.blocks("workspaces")?,
            when: fields.blocks("when")?,
            retries: fields.int("retries")?,
            timeout: fields.string("timeout")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .string("name", &self.name)
            .string("display_name", &self.display_name)
            .block("task_ref", self.task_ref.as_ref())
            .block("task_spec", self.task_spec.as_ref())
            .strings("run_after", &self.run_after)
            .blocks("params", &self.params)
            .blocks("workspaces", &self.workspaces)
            .blocks("when", &self.when)
            .int("retries", self.retries)
            .string("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineWorkspaceDeclaration {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

impl ConfigBlock for PipelineWorkspaceDeclaration {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.required_string("name")?,
            description: fields.string("description")?,
            optional: fields.bool("optional")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .string("name", &self.name)
            .string("description", &self.description)
            .bool("optional", self.optional)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<ParamType>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ParamValue>,
}

impl ConfigBlock for PipelineResult {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.required_string("name")?,
            ty: fields.enumerated("type")?,
            description: fields.string("description")?,
            value: fields.block("value")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .string("name", &self.name)
            .enumerated("type", self.ty)
            .string("description", &self.description)
            .block("value", self.value.as_ref())
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<PipelineTask>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub finally: Vec<PipelineTask>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workspaces: Vec<PipelineWorkspaceDeclaration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<PipelineResult>,
}

impl ConfigBlock for PipelineSpec {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            display_name: fields.string("display_name")?,
            description: fields.string("description")?,
            params: fields.blocks("params")?,
            tasks: fields.blocks("tasks")?,
            finally: fields.blocks("finally")?,
            workspaces: fields.blocks("workspaces")?,
            results: fields.blocks("results")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .string("display_name", &self.display_name)
            .string("description", &self.description)
            .blocks("params", &self.params)
            .blocks("tasks", &self.tasks)
            .blocks("finally", &self.finally)
            .blocks("workspaces", &self.workspaces)
            .blocks("results", &self.results)
            .finish()
    }
}

/// A graph of tasks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    #[serde(flatten)]
    pub type_meta: TypeMeta,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: PipelineSpec,
}

impl Resource for Pipeline {
    const KIND: &'static str = "Pipeline";
    const GROUP: &'static str = super::GROUP;
    const VERSION: &'static str = "v1alpha1";
    const PLURAL: &'static str = "pipelines";

    fn type_meta(&self) -> &TypeMeta {
        &self.type_meta
    }

    fn type_meta_mut(&mut self) -> &mut TypeMeta {
        &mut self.type_meta
    }

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

impl ConfigBlock for Pipeline {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            type_meta: TypeMeta::default(),
            metadata: fields.block("metadata")?.unwrap_or_default(),
            spec: fields.block("spec")?.unwrap_or_default(),
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .section("metadata", &self.metadata)
            .section("spec", &self.spec)
            .finish()
    }
}
