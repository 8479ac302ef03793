//! The untyped store primitive every backend implements.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tekton_core::{GroupVersionResource, ResourceCoordinate};

use crate::error::StoreError;

/// Single-shot CRUD over untyped JSON objects addressed by coordinate.
///
/// Implementations hold no per-object state and perform no retries or
/// caching; every call is one round trip.
///
/// # Example
///
/// ```ignore
/// use tekton_storage::{ResourceStore, StoreError};
///
/// async fn exists(store: &dyn ResourceStore, at: &ResourceCoordinate) -> Result<bool, StoreError> {
///     match store.get(at).await {
///         Ok(_) => Ok(true),
///         Err(e) if e.is_not_found() => Ok(false),
///         Err(e) => Err(e),
///     }
/// }
/// ```
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Fetches one object.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the object does not exist.
    async fn get(&self, coordinate: &ResourceCoordinate) -> Result<Value, StoreError>;

    /// Creates an object in `namespace` and returns the stored representation.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Request` if the server rejects the object.
    async fn create(
        &self,
        gvr: &GroupVersionResource,
        namespace: &str,
        body: &Value,
    ) -> Result<Value, StoreError>;

    /// Applies a JSON Patch document and returns the patched object.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the object does not exist.
    async fn patch(&self, coordinate: &ResourceCoordinate, patch: &[u8])
    -> Result<Value, StoreError>;

    /// Requests deletion. Removal may complete after the call returns.
    async fn delete(&self, coordinate: &ResourceCoordinate) -> Result<(), StoreError>;

    /// Short name of the backend, for logs.
    fn backend_name(&self) -> &'static str;
}

#[async_trait]
impl<T: ResourceStore + ?Sized> ResourceStore for Arc<T> {
    async fn get(&self, coordinate: &ResourceCoordinate) -> Result<Value, StoreError> {
        (**self).get(coordinate).await
    }

    async fn create(
        &self,
        gvr: &GroupVersionResource,
        namespace: &str,
        body: &Value,
    ) -> Result<Value, StoreError> {
        (**self).create(gvr, namespace, body).await
    }

    async fn patch(
        &self,
        coordinate: &ResourceCoordinate,
        patch: &[u8],
    ) -> Result<Value, StoreError> {
        (**self).patch(coordinate, patch).await
    }

    async fn delete(&self, coordinate: &ResourceCoordinate) -> Result<(), StoreError> {
        (**self).delete(coordinate).await
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}
