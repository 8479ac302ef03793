//! In-process resource store.
//!
//! Behaves like a minimal API server: assigns `uid`, `resourceVersion`,
//! `generation` and `creationTimestamp`, applies JSON Patch documents and
//! can simulate eventual consistency. With a visibility delay a freshly
//! created object stays invisible for a number of reads; with a deletion
//! delay a deleted object lingers, marked terminating, for a number of reads.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::{Value, json};
use tekton_core::{GroupVersionResource, ResourceCoordinate, now_utc};

use crate::error::StoreError;
use crate::traits::ResourceStore;

#[derive(Debug)]
struct StoredObject {
    object: Value,
    hidden_reads: u32,
    lingering_reads: Option<u32>,
}

#[derive(Debug)]
pub struct InMemoryStore {
    objects: DashMap<ResourceCoordinate, StoredObject>,
    version_counter: AtomicU64,
    visibility_delay: u32,
    deletion_delay: u32,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            objects: DashMap::new(),
            version_counter: AtomicU64::new(1),
            visibility_delay: 0,
            deletion_delay: 0,
        }
    }

    /// New objects answer `NotFound` for the first `reads` reads.
    pub fn with_visibility_delay(mut self, reads: u32) -> Self {
        self.visibility_delay = reads;
        self
    }

    /// Deleted objects stay readable for `reads` more reads.
    pub fn with_deletion_delay(mut self, reads: u32) -> Self {
        self.deletion_delay = reads;
        self
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Coordinates of every stored object, in no particular order.
    pub fn coordinates(&self) -> Vec<ResourceCoordinate> {
        self.objects.iter().map(|entry| entry.key().clone()).collect()
    }

    fn next_version(&self) -> String {
        self.version_counter
            .fetch_add(1, Ordering::SeqCst)
            .to_string()
    }

    /// Replaces the `status` of a stored object, as a controller would.
    pub fn set_status(&self, coordinate: &ResourceCoordinate, status: Value) -> Result<(), StoreError> {
        let mut stored = self
            .objects
            .get_mut(coordinate)
            .ok_or_else(|| StoreError::not_found(coordinate))?;
        stored.object["status"] = status;
        stored.object["metadata"]["resourceVersion"] = Value::String(self.next_version());
        Ok(())
    }
}

fn metadata_str<'a>(object: &'a Value, field: &str) -> &'a str {
    object
        .pointer(&format!("/metadata/{field}"))
        .and_then(Value::as_str)
        .unwrap_or_default()
}

#[async_trait]
impl ResourceStore for InMemoryStore {
    async fn get(&self, coordinate: &ResourceCoordinate) -> Result<Value, StoreError> {
        let Entry::Occupied(mut entry) = self.objects.entry(coordinate.clone()) else {
            return Err(StoreError::not_found(coordinate));
        };

        let stored = entry.get_mut();
        if stored.hidden_reads > 0 {
            stored.hidden_reads -= 1;
            return Err(StoreError::not_found(coordinate));
        }
        match stored.lingering_reads {
            Some(0) => {
                entry.remove();
                Err(StoreError::not_found(coordinate))
            }
            Some(remaining) => {
                stored.lingering_reads = Some(remaining - 1);
                Ok(stored.object.clone())
            }
            None => Ok(stored.object.clone()),
        }
    }

    async fn create(
        &self,
        gvr: &GroupVersionResource,
        namespace: &str,
        body: &Value,
    ) -> Result<Value, StoreError> {
        if !body.is_object() {
            return Err(StoreError::request(400, "object body expected"));
        }
        let mut object = body.clone();

        let mut name = metadata_str(&object, "name").to_string();
        if name.is_empty() {
            let prefix = metadata_str(&object, "generateName");
            if prefix.is_empty() {
                return Err(StoreError::request(422, "metadata.name: Required value"));
            }
            let suffix = uuid::Uuid::new_v4().simple().to_string();
            name = format!("{prefix}{}", &suffix[..5]);
        }

        let coordinate = ResourceCoordinate::new(gvr.clone(), namespace, name.clone());
        let Entry::Vacant(slot) = self.objects.entry(coordinate) else {
            return Err(StoreError::request(
                409,
                format!("{} \"{name}\" already exists", gvr.resource),
            ));
        };

        let metadata = object
            .as_object_mut()
            .map(|o| o.entry("metadata").or_insert_with(|| json!({})))
            .ok_or_else(|| StoreError::request(400, "object body expected"))?;
        if !metadata.is_object() {
            return Err(StoreError::request(400, "metadata must be an object"));
        }
        metadata["name"] = Value::String(name);
        metadata["namespace"] = Value::String(namespace.to_string());
        metadata["uid"] = Value::String(uuid::Uuid::new_v4().to_string());
        metadata["resourceVersion"] = Value::String(self.next_version());
        metadata["generation"] = json!(1);
        metadata["creationTimestamp"] = serde_json::to_value(now_utc())?;

        tracing::debug!(coordinate = %slot.key(), "stored new object");
        slot.insert(StoredObject {
            object: object.clone(),
            hidden_reads: self.visibility_delay,
            lingering_reads: None,
        });
        Ok(object)
    }

    async fn patch(
        &self,
        coordinate: &ResourceCoordinate,
        patch: &[u8],
    ) -> Result<Value, StoreError> {
        let operations: json_patch::Patch = serde_json::from_slice(patch)
            .map_err(|e| StoreError::request(400, format!("invalid JSON Patch: {e}")))?;

        let mut stored = self
            .objects
            .get_mut(coordinate)
            .ok_or_else(|| StoreError::not_found(coordinate))?;

        let mut patched = stored.object.clone();
        json_patch::patch(&mut patched, &operations)
            .map_err(|e| StoreError::request(422, e.to_string()))?;

        if metadata_str(&patched, "name") != coordinate.name
            || metadata_str(&patched, "namespace") != coordinate.namespace
        {
            return Err(StoreError::request(422, "metadata.name and metadata.namespace are immutable"));
        }

        if patched.get("spec") != stored.object.get("spec") {
            let generation = patched
                .pointer("/metadata/generation")
                .and_then(Value::as_i64)
                .unwrap_or(0);
            patched["metadata"]["generation"] = json!(generation + 1);
        }
        patched["metadata"]["resourceVersion"] = Value::String(self.next_version());

        stored.object = patched.clone();
        Ok(patched)
    }

    async fn delete(&self, coordinate: &ResourceCoordinate) -> Result<(), StoreError> {
        if self.deletion_delay == 0 {
            return self
                .objects
                .remove(coordinate)
                .map(|_| ())
                .ok_or_else(|| StoreError::not_found(coordinate));
        }

        let mut stored = self
            .objects
            .get_mut(coordinate)
            .ok_or_else(|| StoreError::not_found(coordinate))?;
        if stored.lingering_reads.is_none() {
            stored.lingering_reads = Some(self.deletion_delay);
            stored.object["metadata"]["deletionTimestamp"] = serde_json::to_value(now_utc())?;
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tasks() -> GroupVersionResource {
        GroupVersionResource::new("tekton.dev", "v1", "tasks")
    }

    fn at(name: &str) -> ResourceCoordinate {
        ResourceCoordinate::new(tasks(), "ci", name)
    }

    #[tokio::test]
    async fn test_create_assigns_server_fields() {
        let store = InMemoryStore::new();
        let created = store
            .create(&tasks(), "ci", &json!({"metadata": {"name": "build"}, "spec": {}}))
            .await
            .unwrap();
        assert_eq!(created["metadata"]["namespace"], "ci");
        assert_eq!(created["metadata"]["generation"], 1);
        assert!(created["metadata"]["uid"].is_string());
        assert_eq!(store.get(&at("build")).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_generate_name() {
        let store = InMemoryStore::new();
        let created = store
            .create(&tasks(), "ci", &json!({"metadata": {"generateName": "build-"}}))
            .await
            .unwrap();
        let name = created["metadata"]["name"].as_str().unwrap();
        assert!(name.starts_with("build-"));
        assert_eq!(name.len(), "build-".len() + 5);
    }

    #[tokio::test]
    async fn test_duplicate_create_conflicts() {
        let store = InMemoryStore::new();
        let body = json!({"metadata": {"name": "build"}});
        store.create(&tasks(), "ci", &body).await.unwrap();
        let err = store.create(&tasks(), "ci", &body).await.unwrap_err();
        assert!(matches!(err, StoreError::Request { status: 409, .. }));
    }

    #[tokio::test]
    async fn test_patch_bumps_generation_on_spec_change() {
        let store = InMemoryStore::new();
        store
            .create(&tasks(), "ci", &json!({"metadata": {"name": "build"}, "spec": {}}))
            .await
            .unwrap();

        let patched = store
            .patch(&at("build"), br#"[{"op":"add","path":"/metadata/labels","value":{"a":"b"}}]"#)
            .await
            .unwrap();
        assert_eq!(patched["metadata"]["generation"], 1);

        let patched = store
            .patch(&at("build"), br#"[{"op":"add","path":"/spec/description","value":"x"}]"#)
            .await
            .unwrap();
        assert_eq!(patched["metadata"]["generation"], 2);
    }

    #[tokio::test]
    async fn test_patch_errors() {
        let store = InMemoryStore::new();
        let err = store.patch(&at("missing"), b"[]").await.unwrap_err();
        assert!(err.is_not_found());

        store
            .create(&tasks(), "ci", &json!({"metadata": {"name": "build"}}))
            .await
            .unwrap();
        let err = store.patch(&at("build"), b"not json").await.unwrap_err();
        assert!(matches!(err, StoreError::Request { status: 400, .. }));

        let err = store
            .patch(&at("build"), br#"[{"op":"remove","path":"/spec/nothing"}]"#)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Request { status: 422, .. }));
    }

    #[tokio::test]
    async fn test_visibility_delay() {
        let store = InMemoryStore::new().with_visibility_delay(2);
        store
            .create(&tasks(), "ci", &json!({"metadata": {"name": "build"}}))
            .await
            .unwrap();
        assert!(store.get(&at("build")).await.unwrap_err().is_not_found());
        assert!(store.get(&at("build")).await.unwrap_err().is_not_found());
        assert!(store.get(&at("build")).await.is_ok());
    }

    #[tokio::test]
    async fn test_deletion_delay() {
        let store = InMemoryStore::new().with_deletion_delay(1);
        store
            .create(&tasks(), "ci", &json!({"metadata": {"name": "build"}}))
            .await
            .unwrap();
        store.delete(&at("build")).await.unwrap();

        let lingering = store.get(&at("build")).await.unwrap();
        assert!(lingering["metadata"]["deletionTimestamp"].is_string());
        assert!(store.get(&at("build")).await.unwrap_err().is_not_found());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing() {
        let store = InMemoryStore::new();
        assert!(store.delete(&at("nope")).await.unwrap_err().is_not_found());
    }
}
