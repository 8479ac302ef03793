//! Field-level diff between two snapshots of the same object.
//!
//! Only the mutable parts of an object are compared: `metadata.labels`,
//! `metadata.annotations` and everything under `spec`. Objects are walked
//! key by key; arrays and scalars are leaves and are replaced as a whole.
//! The resulting document is a JSON Patch (RFC 6902) whose operations touch
//! disjoint paths, so their order does not affect the outcome.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tekton_core::Resource;

use crate::error::SchemaError;
use crate::fields::{ConfigBlock, Result, expand};
use crate::tree::ConfigMap;

/// Pointers to the subtrees a diff may touch.
pub const MUTABLE_ROOTS: &[&[&str]] = &[&["metadata", "labels"], &["metadata", "annotations"], &["spec"]];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Replace,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: PatchOp,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl PatchOperation {
    pub fn add(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: PatchOp::Add,
            path: path.into(),
            value: Some(value),
        }
    }

    pub fn replace(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: PatchOp::Replace,
            path: path.into(),
            value: Some(value),
        }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self {
            op: PatchOp::Remove,
            path: path.into(),
            value: None,
        }
    }
}

/// An ordered JSON Patch document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatchOperations(Vec<PatchOperation>);

impl PatchOperations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: PatchOperation) {
        self.0.push(op);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PatchOperation> {
        self.0.iter()
    }

    /// Serializes the document as the body of a JSON Patch request.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.0)?)
    }
}

impl IntoIterator for PatchOperations {
    type Item = PatchOperation;
    type IntoIter = std::vec::IntoIter<PatchOperation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a PatchOperations {
    type Item = &'a PatchOperation;
    type IntoIter = std::slice::Iter<'a, PatchOperation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Escapes one reference token of a JSON pointer.
pub fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Computes the operations turning `previous` into `current`.
pub fn diff<R: Resource>(current: &R, previous: &R) -> Result<PatchOperations> {
    let current = serde_json::to_value(current)?;
    let previous = serde_json::to_value(previous)?;
    Ok(diff_values(&current, &previous))
}

/// Like [`diff`], starting from two configuration trees.
pub fn diff_trees<R>(current: &ConfigMap, previous: &ConfigMap) -> Result<PatchOperations>
where
    R: Resource + ConfigBlock,
{
    let current: R = expand(current)?;
    let previous: R = expand(previous)?;
    let ops = diff(&current, &previous)?;
    tracing::debug!(kind = R::KIND, operations = ops.len(), "computed patch");
    Ok(ops)
}

/// Diffs the mutable roots of two wire representations.
pub fn diff_values(current: &Value, previous: &Value) -> PatchOperations {
    let mut ops = PatchOperations::new();
    for root in MUTABLE_ROOTS {
        let pointer: String = root.iter().map(|t| format!("/{}", escape_token(t))).collect();
        diff_node(
            &pointer,
            current.pointer(&pointer),
            previous.pointer(&pointer),
            &mut ops,
        );
    }
    ops
}

fn diff_node(path: &str, current: Option<&Value>, previous: Option<&Value>, ops: &mut PatchOperations) {
    match (current, previous) {
        (Some(Value::Object(cur)), Some(Value::Object(prev))) => {
            for (key, value) in cur {
                let child = format!("{path}/{}", escape_token(key));
                diff_node(&child, Some(value), prev.get(key), ops);
            }
            for key in prev.keys().filter(|k| !cur.contains_key(*k)) {
                ops.push(PatchOperation::remove(format!("{path}/{}", escape_token(key))));
            }
        }
        (Some(cur), None) => ops.push(PatchOperation::add(path, cur.clone())),
        (None, Some(_)) => ops.push(PatchOperation::remove(path)),
        (Some(cur), Some(prev)) if cur != prev => {
            ops.push(PatchOperation::replace(path, cur.clone()))
        }
        _ => {}
    }
}

impl From<PatchOperations> for Vec<PatchOperation> {
    fn from(ops: PatchOperations) -> Self {
        ops.0
    }
}

impl TryFrom<&[u8]> for PatchOperations {
    type Error = SchemaError;

    fn try_from(bytes: &[u8]) -> std::result::Result<Self, Self::Error> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
