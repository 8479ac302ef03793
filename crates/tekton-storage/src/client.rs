//! Typed CRUD for one kind on top of an untyped [`ResourceStore`].

use std::marker::PhantomData;
use std::sync::Arc;

use tekton_core::{Resource, ResourceCoordinate};

use crate::error::StoreError;
use crate::traits::ResourceStore;

/// Create/get/update/delete for kind `R`.
///
/// The client is stateless: it owns a handle to the store and nothing else,
/// and can be cloned and shared freely.
pub struct ResourceClient<R> {
    store: Arc<dyn ResourceStore>,
    _kind: PhantomData<fn() -> R>,
}

impl<R> Clone for ResourceClient<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _kind: PhantomData,
        }
    }
}

impl<R: Resource> ResourceClient<R> {
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self {
            store,
            _kind: PhantomData,
        }
    }

    pub fn store(&self) -> &Arc<dyn ResourceStore> {
        &self.store
    }

    pub fn coordinate(namespace: &str, name: &str) -> ResourceCoordinate {
        ResourceCoordinate::new(R::gvr(), namespace, name)
    }

    fn decode(value: serde_json::Value) -> Result<R, StoreError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Submits `obj` as a new object. On success `obj` is replaced by the
    /// stored representation; on failure it is left untouched.
    pub async fn create(&self, obj: &mut R) -> Result<(), StoreError> {
        let mut outbound = obj.clone();
        outbound.prepare_for_create();

        let namespace = outbound.metadata().namespace.clone();
        if namespace.is_empty() {
            return Err(StoreError::client(format!(
                "{} has no namespace",
                R::KIND
            )));
        }

        let body = serde_json::to_value(&outbound)?;
        tracing::debug!(
            kind = R::KIND,
            namespace = %namespace,
            name = %outbound.metadata().name,
            backend = self.store.backend_name(),
            "creating resource"
        );
        let stored = self.store.create(&R::gvr(), &namespace, &body).await?;
        *obj = Self::decode(stored)?;
        Ok(())
    }

    pub async fn get(&self, namespace: &str, name: &str) -> Result<R, StoreError> {
        let coordinate = Self::coordinate(namespace, name);
        tracing::debug!(kind = R::KIND, namespace, name, "fetching resource");
        let value = self.store.get(&coordinate).await?;
        Self::decode(value)
    }

    /// Applies a JSON Patch and decodes the patched object into `target`.
    pub async fn update(
        &self,
        namespace: &str,
        name: &str,
        patch: &[u8],
        target: &mut R,
    ) -> Result<(), StoreError> {
        let coordinate = Self::coordinate(namespace, name);
        tracing::debug!(
            kind = R::KIND,
            namespace,
            name,
            bytes = patch.len(),
            "patching resource"
        );
        let value = self.store.patch(&coordinate, patch).await?;
        *target = Self::decode(value)?;
        Ok(())
    }

    pub async fn delete(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        let coordinate = Self::coordinate(namespace, name);
        tracing::debug!(kind = R::KIND, namespace, name, "deleting resource");
        self.store.delete(&coordinate).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use tekton_core::ObjectMeta;
    use tekton_schema::{Task, TaskRun};

    fn client<R: Resource>() -> ResourceClient<R> {
        ResourceClient::new(Arc::new(InMemoryStore::new()))
    }

    #[tokio::test]
    async fn test_create_stamps_type_meta_and_overwrites() {
        let client = client::<Task>();
        let mut task = Task {
            metadata: ObjectMeta::named("ci", "build"),
            ..Default::default()
        };
        client.create(&mut task).await.unwrap();

        assert_eq!(task.type_meta.api_version, "tekton.dev/v1");
        assert_eq!(task.type_meta.kind, "Task");
        assert!(!task.metadata.uid.is_empty());
        assert!(task.metadata.creation_timestamp.is_some());
    }

    #[tokio::test]
    async fn test_create_failure_leaves_input_untouched() {
        let client = client::<Task>();
        let mut task = Task {
            metadata: ObjectMeta::named("ci", "build"),
            ..Default::default()
        };
        client.create(&mut task.clone()).await.unwrap();

        let before = task.clone();
        let err = client.create(&mut task).await.unwrap_err();
        assert!(err.is_request_error());
        assert_eq!(task, before);
    }

    #[tokio::test]
    async fn test_create_requires_namespace() {
        let client = client::<TaskRun>();
        let mut run = TaskRun::default();
        run.metadata.name = "r".into();
        let err = client.create(&mut run).await.unwrap_err();
        assert!(matches!(err, StoreError::Client { .. }));
    }

    #[tokio::test]
    async fn test_get_not_found_is_distinguishable() {
        let client = client::<Task>();
        let err = client.get("ci", "missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_decodes_into_target() {
        let client = client::<Task>();
        let mut task = Task {
            metadata: ObjectMeta::named("ci", "build"),
            ..Default::default()
        };
        client.create(&mut task).await.unwrap();

        let patch = br#"[{"op":"add","path":"/spec/description","value":"patched"}]"#;
        let mut target = Task::default();
        client.update("ci", "build", patch, &mut target).await.unwrap();
        assert_eq!(target.spec.description, "patched");
        assert_eq!(target.metadata.name, "build");

        client.delete("ci", "build").await.unwrap();
        assert!(client.get("ci", "build").await.unwrap_err().is_not_found());
    }
}
