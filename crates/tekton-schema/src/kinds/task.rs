use serde::{Deserialize, Serialize};
use tekton_core::{ObjectMeta, Resource, TypeMeta};

use super::common::{EnvVar, ParamSpec, TaskResult, VolumeMount};
use crate::fields::{ConfigBlock, FieldReader, FieldWriter, Result};
use crate::tree::ConfigMap;

/// A workspace a step wants exclusive access to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceUsage {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mount_path: String,
}

impl ConfigBlock for WorkspaceUsage {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.required_string("name")?,
            mount_path: fields.string("mount_path")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .string("name", &self.name)
            .string("mount_path", &self.mount_path)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub working_dir: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image_pull_policy: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub script: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub timeout: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workspaces: Vec<WorkspaceUsage>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub on_error: String,
}

impl ConfigBlock for Step {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.required_string("name")?,
            image: fields.string("image")?,
            command: fields.strings("command")?,
            args: fields.strings("args")?,
            working_dir: fields.string("working_dir")?,
            env: fields.blocks("env")?,
            volume_mounts: fields.blocks("volume_mounts")?,
            image_pull_policy: fields.string("image_pull_policy")?,
            script: fields.string("script")?,
            timeout: fields.string("timeout")?,
            workspaces: fields.blocks("workspaces")?,
            on_error: fields.string("on_error")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .string("name", &self.name)
            .string("image", &self.image)
            .strings("command", &self.command)
            .strings("args", &self.args)
            .string("working_dir", &self.working_dir)
            .blocks("env", &self.env)
            .blocks("volume_mounts", &self.volume_mounts)
            .string("image_pull_policy", &self.image_pull_policy)
            .string("script", &self.script)
            .string("timeout", &self.timeout)
            .blocks("workspaces", &self.workspaces)
            .string("on_error", &self.on_error)
            .finish()
    }
}

/// Defaults merged into every step of a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepTemplate {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub working_dir: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image_pull_policy: String,
}

impl ConfigBlock for StepTemplate {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            image: fields.string("image")?,
            command: fields.strings("command")?,
            args: fields.strings("args")?,
            working_dir: fields.string("working_dir")?,
            env: fields.blocks("env")?,
            volume_mounts: fields.blocks("volume_mounts")?,
            image_pull_policy: fields.string("image_pull_policy")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .string("image", &self.image)
            .strings("command", &self.command)
            .strings("args", &self.args)
            .string("working_dir", &self.working_dir)
            .blocks("env", &self.env)
            .blocks("volume_mounts", &self.volume_mounts)
            .string("image_pull_policy", &self.image_pull_policy)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sidecar {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub working_dir: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub script: String,
}

impl ConfigBlock for Sidecar {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.required_string("name")?,
            image: fields.string("image")?,
            command: fields.strings("command")?,
            args: fields.strings("args")?,
            working_dir: fields.string("working_dir")?,
            env: fields.blocks("env")?,
            volume_mounts: fields.blocks("volume_mounts")?,
            script: fields.string("script")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .string("name", &self.name)
            .string("image", &self.image)
            .strings("command", &self.command)
            .strings("args", &self.args)
            .string("working_dir", &self.working_dir)
            .blocks("env", &self.env)
            .blocks("volume_mounts", &self.volume_mounts)
            .string("script", &self.script)
            .finish()
    }
}

/// A workspace a task expects to be bound at run time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceDeclaration {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mount_path: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

impl ConfigBlock for WorkspaceDeclaration {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.required_string("name")?,
            description: fields.string("description")?,
            mount_path: fields.string("mount_path")?,
            read_only: fields.bool("read_only")?,
            optional: fields.bool("optional")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .string("name", &self.name)
            .string("description", &self.description)
            .string("mount_path", &self.mount_path)
            .bool("read_only", self.read_only)
            .bool("optional", self.optional)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_template: Option<StepTemplate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sidecars: Vec<Sidecar>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workspaces: Vec<WorkspaceDeclaration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<TaskResult>,
}

impl ConfigBlock for TaskSpec {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            display_name: fields.string("display_name")?,
            description: fields.string("description")?,
            params: fields.blocks("params")?,
            steps: fields.blocks("steps")?,
            step_template: fields.block("step_template")?,
            sidecars: fields.blocks("sidecars")?,
            workspaces: fields.blocks("workspaces")?,
            results: fields.blocks("results")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .string("display_name", &self.display_name)
            .string("description", &self.description)
            .blocks("params", &self.params)
            .blocks("steps", &self.steps)
            .block("step_template", self.step_template.as_ref())
            .blocks("sidecars", &self.sidecars)
            .blocks("workspaces", &self.workspaces)
            .blocks("results", &self.results)
            .finish()
    }
}

/// A reusable sequence of steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(flatten)]
    pub type_meta: TypeMeta,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: TaskSpec,
}

impl Resource for Task {
    const KIND: &'static str = "Task";
    const GROUP: &'static str = super::GROUP;
    const VERSION: &'static str = "v1";
    const PLURAL: &'static str = "tasks";

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

impl ConfigBlock for Task {
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
