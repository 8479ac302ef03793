use serde::{Deserialize, Serialize};
use tekton_core::{ObjectMeta, Readiness, Resource, Timestamp, TypeMeta};

use super::common::{Condition, Param, ParamType, ParamValue, timestamp, timestamp_string};
use super::task::TaskSpec;
use super::readiness_from_conditions;
use crate::fields::{ConfigBlock, FieldReader, FieldWriter, Result};
use crate::string_enum;
use crate::tree::ConfigMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,
}

impl ConfigBlock for TaskRef {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.required_string("name")?,
            kind: fields.string("kind")?,
            api_version: fields.string("api_version")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .string("name", &self.name)
            .string("kind", &self.kind)
            .string("api_version", &self.api_version)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyDirSource {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub medium: String,
}

impl ConfigBlock for EmptyDirSource {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            medium: fields.string("medium")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new().string("medium", &self.medium).finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolumeClaimSource {
    pub claim_name: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
}

impl ConfigBlock for PersistentVolumeClaimSource {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            claim_name: fields.required_string("claim_name")?,
            read_only: fields.bool("read_only")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .string("claim_name", &self.claim_name)
            .bool("read_only", self.read_only)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigMapSource {
    pub name: String,
}

impl ConfigBlock for ConfigMapSource {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.required_string("name")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new().string("name", &self.name).finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretSource {
    pub secret_name: String,
}

impl ConfigBlock for SecretSource {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            secret_name: fields.required_string("secret_name")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .string("secret_name", &self.secret_name)
            .finish()
    }
}

/// Binds a declared workspace to a concrete volume source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceBinding {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sub_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_dir: Option<EmptyDirSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent_volume_claim: Option<PersistentVolumeClaimSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_map: Option<ConfigMapSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<SecretSource>,
}

impl ConfigBlock for WorkspaceBinding {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.required_string("name")?,
            sub_path: fields.string("sub_path")?,
            empty_dir: fields.block("empty_dir")?,
            persistent_volume_claim: fields.block("persistent_volume_claim")?,
            config_map: fields.block("config_map")?,
            secret: fields.block("secret")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .string("name", &self.name)
            .string("sub_path", &self.sub_path)
            .block("empty_dir", self.empty_dir.as_ref())
            .block("persistent_volume_claim", self.persistent_volume_claim.as_ref())
            .block("config_map", self.config_map.as_ref())
            .block("secret", self.secret.as_ref())
            .finish()
    }
}

string_enum! {
    /// Requested lifecycle override of a task run.
    pub enum TaskRunSpecStatus {
        Cancelled => "TaskRunCancelled",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRunSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_ref: Option<TaskRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_spec: Option<TaskSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub service_account_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub timeout: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workspaces: Vec<WorkspaceBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskRunSpecStatus>,
}

impl ConfigBlock for TaskRunSpec {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            task_ref: fields.block("task_ref")?,
            task_spec: fields.block("task_spec")?,
            params: fields.blocks("params")?,
            service_account_name: fields.string("service_account_name")?,
            timeout: fields.string("timeout")?,
            workspaces: fields.blocks("workspaces")?,
            status: fields.enumerated("status")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .block("task_ref", self.task_ref.as_ref())
            .block("task_spec", self.task_spec.as_ref())
            .blocks("params", &self.params)
            .string("service_account_name", &self.service_account_name)
            .string("timeout", &self.timeout)
            .blocks("workspaces", &self.workspaces)
            .enumerated("status", self.status)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRunResult {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<ParamType>,
    pub value: ParamValue,
}

impl ConfigBlock for TaskRunResult {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.required_string("name")?,
            ty: fields.enumerated("type")?,
            value: fields.block("value")?.unwrap_or_default(),
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .string("name", &self.name)
            .enumerated("type", self.ty)
            .block("value", Some(&self.value))
            .finish()
    }
}

/// Observed state of a task run. Written by the store only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRunStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pod_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_time: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<TaskRunResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_spec: Option<TaskSpec>,
}

impl ConfigBlock for TaskRunStatus {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            conditions: fields.blocks("conditions")?,
            pod_name: fields.string("pod_name")?,
            start_time: timestamp(fields, "start_time")?,
            completion_time: timestamp(fields, "completion_time")?,
            results: fields.blocks("results")?,
            task_spec: fields.block("task_spec")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .blocks("conditions", &self.conditions)
            .string("pod_name", &self.pod_name)
            .string("start_time", &timestamp_string(self.start_time))
            .string("completion_time", &timestamp_string(self.completion_time))
            .blocks("results", &self.results)
            .block("task_spec", self.task_spec.as_ref())
            .finish()
    }
}

/// One execution of a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskRun {
    #[serde(flatten)]
    pub type_meta: TypeMeta,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: TaskRunSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskRunStatus>,
}

impl Resource for TaskRun {
    const KIND: &'static str = "TaskRun";
    const GROUP: &'static str = super::GROUP;
    const VERSION: &'static str = "v1alpha1";
    const PLURAL: &'static str = "taskruns";

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

    fn clear_status(&mut self) {
        self.status = None;
    }

    fn readiness(&self) -> Readiness {
        readiness_from_conditions(self.status.as_ref().map(|s| s.conditions.as_slice()))
    }
}

impl ConfigBlock for TaskRun {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            type_meta: TypeMeta::default(),
            metadata: fields.block("metadata")?.unwrap_or_default(),
            spec: fields.block("spec")?.unwrap_or_default(),
            status: fields.block("status")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        let writer = FieldWriter::new()
            .section("metadata", &self.metadata)
            .section("spec", &self.spec);
        match &self.status {
            Some(status) => writer.section("status", status),
            None => writer,
        }
        .finish()
    }
}
