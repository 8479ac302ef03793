//! Building blocks shared by more than one kind.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tekton_core::Timestamp;

use crate::error::SchemaError;
use crate::fields::{ConfigBlock, FieldReader, FieldWriter, Result};
use crate::string_enum;
use crate::tree::ConfigMap;

string_enum! {
    /// Declared type of a parameter, property or result.
    pub enum ParamType {
        String => "string",
        Array => "array",
        Object => "object",
    }
}

impl Default for ParamType {
    fn default() -> Self {
        Self::String
    }
}

/// A parameter value. On the wire it is untagged: a plain string, an array
/// of strings or an object of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    String(String),
    Array(Vec<String>),
    Object(BTreeMap<String, String>),
}

impl Default for ParamValue {
    fn default() -> Self {
        Self::String(String::new())
    }
}

impl ParamValue {
    pub fn param_type(&self) -> ParamType {
        match self {
            Self::String(_) => ParamType::String,
            Self::Array(_) => ParamType::Array,
            Self::Object(_) => ParamType::Object,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

// In the tree a value is a block of `type` plus one of `string_val`,
// `array_val`, `object_val`. Without an explicit type the populated
// field wins, falling back to string.
impl ConfigBlock for ParamValue {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        let declared = fields.enumerated::<ParamType>("type")?;
        let ty = match declared {
            Some(ty) => ty,
            None if fields.has("array_val") => ParamType::Array,
            None if fields.has("object_val") => ParamType::Object,
            None => ParamType::String,
        };
        Ok(match ty {
            ParamType::String => Self::String(fields.string("string_val")?),
            ParamType::Array => Self::Array(fields.strings("array_val")?),
            ParamType::Object => Self::Object(fields.string_map("object_val")?),
        })
    }

    fn flatten(&self) -> ConfigMap {
        let writer = FieldWriter::new().enumerated("type", Some(self.param_type()));
        match self {
            Self::String(s) => writer.string("string_val", s),
            Self::Array(items) => writer.strings("array_val", items),
            Self::Object(entries) => writer.string_map("object_val", entries),
        }
        .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySpec {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<ParamType>,
}

impl ConfigBlock for PropertySpec {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            ty: fields.enumerated("type")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new().enumerated("type", self.ty).finish()
    }
}

/// Declaration of an input parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<ParamType>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, PropertySpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ParamValue>,
}

impl ConfigBlock for ParamSpec {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.required_string("name")?,
            ty: fields.enumerated("type")?,
            description: fields.string("description")?,
            properties: fields.block_map("properties")?,
            default: fields.block("default")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .string("name", &self.name)
            .enumerated("type", self.ty)
            .string("description", &self.description)
            .block_map("properties", &self.properties)
            .block("default", self.default.as_ref())
            .finish()
    }
}

/// A concrete parameter binding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub value: ParamValue,
}

impl Param {
    pub fn new(name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl ConfigBlock for Param {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.required_string("name")?,
            value: fields.required_block("value")?,
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
pub struct EnvVar {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
}

impl ConfigBlock for EnvVar {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.required_string("name")?,
            value: fields.string("value")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .string("name", &self.name)
            .string("value", &self.value)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMount {
    pub name: String,
    pub mount_path: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sub_path: String,
}

impl ConfigBlock for VolumeMount {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.required_string("name")?,
            mount_path: fields.required_string("mount_path")?,
            read_only: fields.bool("read_only")?,
            sub_path: fields.string("sub_path")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .string("name", &self.name)
            .string("mount_path", &self.mount_path)
            .bool("read_only", self.read_only)
            .string("sub_path", &self.sub_path)
            .finish()
    }
}

/// A result declared by a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<ParamType>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl ConfigBlock for TaskResult {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.required_string("name")?,
            ty: fields.enumerated("type")?,
            description: fields.string("description")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .string("name", &self.name)
            .enumerated("type", self.ty)
            .string("description", &self.description)
            .finish()
    }
}

string_enum! {
    pub enum ConditionStatus {
        True => "True",
        False => "False",
        Unknown => "Unknown",
    }
}

/// A status condition reported by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub ty: String,
    pub status: ConditionStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<Timestamp>,
}

impl ConfigBlock for Condition {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            ty: fields.required_string("type")?,
            status: fields.required_enumerated("status")?,
            reason: fields.string("reason")?,
            message: fields.string("message")?,
            last_transition_time: timestamp(fields, "last_transition_time")?,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .string("type", &self.ty)
            .enumerated("status", Some(self.status))
            .string("reason", &self.reason)
            .string("message", &self.message)
            .string("last_transition_time", &timestamp_string(self.last_transition_time))
            .finish()
    }
}

/// Condition type that run kinds use to report their outcome.
pub const SUCCEEDED_CONDITION: &str = "Succeeded";

/// Finds the `Succeeded` condition among `conditions`.
pub fn succeeded_condition(conditions: &[Condition]) -> Option<&Condition> {
    conditions.iter().find(|c| c.ty == SUCCEEDED_CONDITION)
}

/// Reads an optional RFC 3339 timestamp leaf.
pub(crate) fn timestamp(fields: &FieldReader<'_>, key: &str) -> Result<Option<Timestamp>> {
    let raw = fields.string(key)?;
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| SchemaError::type_mismatch(fields.path().join(key), "RFC 3339 timestamp"))
}

pub(crate) fn timestamp_string(value: Option<Timestamp>) -> String {
    value.map(|t| t.to_string()).unwrap_or_default()
}
