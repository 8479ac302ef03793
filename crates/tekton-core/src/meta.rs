use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// `apiVersion` and `kind` of an object. Owned by the client, which stamps
/// them before every submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMeta {
    #[serde(rename = "apiVersion", default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
}

impl TypeMeta {
    pub fn new(api_version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
        }
    }
}

/// Standard object metadata. `uid`, `resource_version`, `generation` and
/// `creation_timestamp` are assigned by the store and never sent by us.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub generate_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uid: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_version: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub generation: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_timestamp: Option<Timestamp>,
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}

impl ObjectMeta {
    pub fn named(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Clears the fields the store assigns on creation.
    pub fn clear_server_fields(&mut self) {
        self.uid.clear();
        self.resource_version.clear();
        self.generation = 0;
        self.creation_timestamp = None;
        self.deletion_timestamp = None;
    }

    /// True once the store has marked the object for deletion.
    pub fn is_terminating(&self) -> bool {
        self.deletion_timestamp.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_meta_skips_empty_fields() {
        let meta = ObjectMeta::named("default", "build");
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value, json!({"name": "build", "namespace": "default"}));
    }

    #[test]
    fn test_object_meta_camel_case() {
        let value = json!({
            "name": "build",
            "namespace": "default",
            "resourceVersion": "42",
            "uid": "8d1f",
            "generation": 3,
            "creationTimestamp": "2024-05-15T14:30:00Z",
            "labels": {"app": "ci"},
            "managedFields": []
        });
        let meta: ObjectMeta = serde_json::from_value(value).unwrap();
        assert_eq!(meta.resource_version, "42");
        assert_eq!(meta.generation, 3);
        assert_eq!(meta.labels.get("app").map(String::as_str), Some("ci"));
        assert_eq!(
            meta.creation_timestamp.unwrap().to_string(),
            "2024-05-15T14:30:00Z"
        );
        assert!(!meta.is_terminating());
    }

    #[test]
    fn test_type_meta_serialization() {
        let tm = TypeMeta::new("tekton.dev/v1", "Task");
        assert_eq!(
            serde_json::to_value(&tm).unwrap(),
            json!({"apiVersion": "tekton.dev/v1", "kind": "Task"})
        );
    }

    #[test]
    fn test_builders() {
        let meta = ObjectMeta::named("ci", "lint")
            .with_label("team", "infra")
            .with_annotation("note", "x");
        assert_eq!(meta.labels.len(), 1);
        assert_eq!(meta.annotations.len(), 1);
    }
}
