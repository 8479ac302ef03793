use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tekton_core::{ObjectMeta, Readiness, Resource, Timestamp, TypeMeta};

use super::common::{Condition, EnvVar, Param, ParamValue, timestamp, timestamp_string};
use super::pipeline::{PipelineSpec, WhenExpression};
use super::readiness_from_conditions;
use super::task_run::WorkspaceBinding;
use crate::fields::{ConfigBlock, FieldReader, FieldWriter, Result};
use crate::string_enum;
use crate::tree::ConfigMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,
}

impl ConfigBlock for PipelineRef {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.required_string("name")?,
            api_version: fields.string("api_version")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .string("name", &self.name)
            .string("api_version", &self.api_version)
            .finish()
    }
}

string_enum! {
    /// Requested lifecycle override of a pipeline run.
    pub enum PipelineRunSpecStatus {
        Cancelled => "Cancelled",
        CancelledRunFinally => "CancelledRunFinally",
        StoppedRunFinally => "StoppedRunFinally",
        Pending => "PipelineRunPending",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutFields {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pipeline: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tasks: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub finally: String,
}

impl ConfigBlock for TimeoutFields {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            pipeline: fields.string("pipeline")?,
            tasks: fields.string("tasks")?,
            finally: fields.string("finally")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .string("pipeline", &self.pipeline)
            .string("tasks", &self.tasks)
            .string("finally", &self.finally)
            .finish()
    }
}

string_enum! {
    pub enum DnsPolicy {
        ClusterFirst => "ClusterFirst",
        ClusterFirstWithHostNet => "ClusterFirstWithHostNet",
        Default => "Default",
        None => "None",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalObjectReference {
    pub name: String,
}

impl ConfigBlock for LocalObjectReference {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.required_string("name")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new().string("name", &self.name).finish()
    }
}

/// Pod settings applied to every task run of a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodTemplate {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub node_selector: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_pull_secrets: Vec<LocalObjectReference>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scheduler_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub priority_class_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub runtime_class_name: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub host_network: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_policy: Option<DnsPolicy>,
}

impl ConfigBlock for PodTemplate {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            node_selector: fields.string_map("node_selector")?,
            env: fields.blocks("env")?,
            image_pull_secrets: fields.blocks("image_pull_secrets")?,
            scheduler_name: fields.string("scheduler_name")?,
            priority_class_name: fields.string("priority_class_name")?,
            runtime_class_name: fields.string("runtime_class_name")?,
            host_network: fields.bool("host_network")?,
            dns_policy: fields.enumerated("dns_policy")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .string_map("node_selector", &self.node_selector)
            .blocks("env", &self.env)
            .blocks("image_pull_secrets", &self.image_pull_secrets)
            .string("scheduler_name", &self.scheduler_name)
            .string("priority_class_name", &self.priority_class_name)
            .string("runtime_class_name", &self.runtime_class_name)
            .bool("host_network", self.host_network)
            .enumerated("dns_policy", self.dns_policy)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineTaskRunTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_template: Option<PodTemplate>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub service_account_name: String,
}

impl ConfigBlock for PipelineTaskRunTemplate {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            pod_template: fields.block("pod_template")?,
            service_account_name: fields.string("service_account_name")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .block("pod_template", self.pod_template.as_ref())
            .string("service_account_name", &self.service_account_name)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRunSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_ref: Option<PipelineRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_spec: Option<PipelineSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PipelineRunSpecStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeouts: Option<TimeoutFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_run_template: Option<PipelineTaskRunTemplate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workspaces: Vec<WorkspaceBinding>,
}

impl ConfigBlock for PipelineRunSpec {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            pipeline_ref: fields.block("pipeline_ref")?,
            pipeline_spec: fields.block("pipeline_spec")?,
            params: fields.blocks("params")?,
            status: fields.enumerated("status")?,
            timeouts: fields.block("timeouts")?,
            task_run_template: fields.block("task_run_template")?,
            workspaces: fields.blocks("workspaces")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .block("pipeline_ref", self.pipeline_ref.as_ref())
            .block("pipeline_spec", self.pipeline_spec.as_ref())
            .blocks("params", &self.params)
            .enumerated("status", self.status)
            .block("timeouts", self.timeouts.as_ref())
            .block("task_run_template", self.task_run_template.as_ref())
            .blocks("workspaces", &self.workspaces)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRunResult {
    pub name: String,
    pub value: ParamValue,
}

impl ConfigBlock for PipelineRunResult {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.required_string("name")?,
            value: fields.block("value")?.unwrap_or_default(),
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .string("name", &self.name)
            .block("value", Some(&self.value))
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedTask {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub when_expressions: Vec<WhenExpression>,
}

impl ConfigBlock for SkippedTask {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.required_string("name")?,
            reason: fields.string("reason")?,
            when_expressions: fields.blocks("when_expressions")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .string("name", &self.name)
            .string("reason", &self.reason)
            .blocks("when_expressions", &self.when_expressions)
            .finish()
    }
}

/// Pointer from a pipeline run to one of the runs it spawned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildStatusReference {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pipeline_task_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub when_expressions: Vec<WhenExpression>,
}

impl ConfigBlock for ChildStatusReference {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.required_string("name")?,
            pipeline_task_name: fields.string("pipeline_task_name")?,
            kind: fields.string("kind")?,
            api_version: fields.string("api_version")?,
            when_expressions: fields.blocks("when_expressions")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .string("name", &self.name)
            .string("pipeline_task_name", &self.pipeline_task_name)
            .string("kind", &self.kind)
            .string("api_version", &self.api_version)
            .blocks("when_expressions", &self.when_expressions)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRunStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_time: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finally_start_time: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<PipelineRunResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_tasks: Vec<SkippedTask>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_references: Vec<ChildStatusReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_spec: Option<PipelineSpec>,
}

impl ConfigBlock for PipelineRunStatus {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            conditions: fields.blocks("conditions")?,
            start_time: timestamp(fields, "start_time")?,
            completion_time: timestamp(fields, "completion_time")?,
            finally_start_time: timestamp(fields, "finally_start_time")?,
            results: fields.blocks("results")?,
            skipped_tasks: fields.blocks("skipped_tasks")?,
            child_references: fields.blocks("child_references")?,
            pipeline_spec: fields.block("pipeline_spec")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .blocks("conditions", &self.conditions)
            .string("start_time", &timestamp_string(self.start_time))
            .string("completion_time", &timestamp_string(self.completion_time))
            .string("finally_start_time", &timestamp_string(self.finally_start_time))
            .blocks("results", &self.results)
            .blocks("skipped_tasks", &self.skipped_tasks)
            .blocks("child_references", &self.child_references)
            .block("pipeline_spec", self.pipeline_spec.as_ref())
            .finish()
    }
}

/// One execution of a pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineRun {
    #[serde(flatten)]
    pub type_meta: TypeMeta,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: PipelineRunSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PipelineRunStatus>,
}

impl Resource for PipelineRun {
    const KIND: &'static str = "PipelineRun";
    const GROUP: &'static str = super::GROUP;
    const VERSION: &'static str = "v1alpha1";
    const PLURAL: &'static str = "pipelineruns";

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

impl ConfigBlock for PipelineRun {
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
