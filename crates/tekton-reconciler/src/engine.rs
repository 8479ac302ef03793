//! Create/read/update/delete/exists for one kind against the remote store.

use std::sync::Arc;
use std::time::Duration;

use tekton_core::{ObjectId, Readiness, Resource};
use tekton_schema::{ConfigMap, Kind, diff_trees, expand, flatten, validate};
use tekton_storage::{ResourceClient, ResourceStore};

use crate::config::ProviderConfig;
use crate::error::{ObjectRef, Operation, ReconcileError, Result};
use crate::resource_data::ResourceData;
use crate::state::LifecycleState;
use crate::wait::{Cancellation, Observation, StateWait};

const CREATE_PENDING: &[LifecycleState] = &[LifecycleState::Creating];
const CREATE_TARGET: &[LifecycleState] = &[LifecycleState::Succeeded];
const DELETE_PENDING: &[LifecycleState] = &[LifecycleState::Deleting];

/// Reconciles objects of kind `R`.
///
/// Every operation runs to completion on the calling task. The reconciler
/// keeps no per-object state; everything an operation needs comes from the
/// [`ResourceData`] passed in.
pub struct Reconciler<R> {
    client: ResourceClient<R>,
    default_namespace: String,
    poll_interval: Duration,
    cancel: Cancellation,
}

impl<R> Clone for Reconciler<R> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            default_namespace: self.default_namespace.clone(),
            poll_interval: self.poll_interval,
            cancel: self.cancel.clone(),
        }
    }
}

impl<R: Kind> Reconciler<R> {
    pub fn new(store: Arc<dyn ResourceStore>, config: &ProviderConfig) -> Self {
        Self {
            client: ResourceClient::new(store),
            default_namespace: config.defaults.namespace.clone(),
            poll_interval: config.poll.interval,
            cancel: Cancellation::never(),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Poll loops stop with `Cancelled` once the signal turns `true`.
    pub fn with_cancellation(mut self, cancel: impl Into<Cancellation>) -> Self {
        self.cancel = cancel.into();
        self
    }

    pub fn client(&self) -> &ResourceClient<R> {
        &self.client
    }

    fn expand_config(config: &ConfigMap, operation: Operation) -> Result<R> {
        validate::<R>(config)
            .and_then(|()| expand::<R>(config))
            .map_err(|e| ReconcileError::schema(R::KIND, operation, e))
    }

    /// Submits the configured object and waits until it reaches `Succeeded`.
    ///
    /// The identity and the flattened response are recorded as soon as the
    /// store accepts the object, so a failed wait still leaves the object
    /// tracked.
    pub async fn create(&self, data: &mut ResourceData) -> Result<()> {
        let mut obj = Self::expand_config(data.config(), Operation::Create)?;
        if obj.metadata().namespace.is_empty() {
            obj.metadata_mut().namespace = self.default_namespace.clone();
        }

        let requested = ObjectRef::new(R::KIND, &obj.metadata().namespace, &obj.metadata().name);
        tracing::info!(
            kind = R::KIND,
            namespace = %requested.namespace,
            name = %requested.name,
            "creating resource"
        );
        self.client
            .create(&mut obj)
            .await
            .map_err(|e| ReconcileError::store(&requested, Operation::Create, e))?;

        let id = ObjectId::from_meta(obj.metadata())?;
        data.set_id(id.to_string());
        data.set_state(flatten(&obj));
        tracing::info!(kind = R::KIND, id = %id, "resource submitted");

        let object = ObjectRef::new(R::KIND, &id.namespace, &id.name);
        let wait = StateWait {
            pending: CREATE_PENDING,
            target: CREATE_TARGET,
            timeout: data.timeouts().create,
            interval: self.poll_interval,
        };
        let client = &self.client;
        let (object_ref, id_ref) = (&object, &id);
        let mut cancel = self.cancel.clone();
        let observed = wait
            .run(&object, Operation::Create, &mut cancel, move || {
                observe_creation(client, object_ref, id_ref)
            })
            .await?;

        if let Some(obj) = observed {
            data.set_state(flatten(&obj));
        }
        tracing::info!(kind = R::KIND, id = %id, "resource ready");
        Ok(())
    }

    /// Fetches the object and records it as the current snapshot.
    pub async fn read(&self, data: &mut ResourceData) -> Result<()> {
        self.read_as(data, Operation::Read).await
    }

    async fn read_as(&self, data: &mut ResourceData, operation: Operation) -> Result<()> {
        let id = data.object_id()?;
        let object = ObjectRef::new(R::KIND, &id.namespace, &id.name);
        tracing::debug!(kind = R::KIND, id = %id, operation = %operation, "reading resource");

        match self.client.get(&id.namespace, &id.name).await {
            Ok(obj) => {
                data.set_state(flatten(&obj));
                Ok(())
            }
            Err(e) => {
                if e.is_not_found() {
                    tracing::warn!(kind = R::KIND, id = %id, "resource not found");
                }
                Err(ReconcileError::store(&object, operation, e))
            }
        }
    }

    /// Patches the object toward the desired configuration, then reads it back.
    ///
    /// The desired tree is diffed against the last snapshot. Without a
    /// snapshot the baseline is empty and every configured field is
    /// re-asserted.
    pub async fn update(&self, data: &mut ResourceData) -> Result<()> {
        let id = data.object_id()?;
        let object = ObjectRef::new(R::KIND, &id.namespace, &id.name);
        Self::expand_config(data.config(), Operation::Update)?;

        let baseline = data.state().cloned().unwrap_or_default();
        let ops = diff_trees::<R>(data.config(), &baseline)
            .map_err(|e| ReconcileError::schema(R::KIND, Operation::Update, e))?;

        if ops.is_empty() {
            tracing::debug!(kind = R::KIND, id = %id, "no changes to apply");
        } else {
            let patch = ops
                .to_json_bytes()
                .map_err(|e| ReconcileError::schema(R::KIND, Operation::Update, e))?;
            tracing::info!(kind = R::KIND, id = %id, operations = ops.len(), "updating resource");
            let mut target = R::default();
            self.client
                .update(&id.namespace, &id.name, &patch, &mut target)
                .await
                .map_err(|e| ReconcileError::store(&object, Operation::Update, e))?;
        }

        self.read_as(data, Operation::Update).await
    }

    /// Requests deletion and waits until the store no longer returns the
    /// object. On success the identity is cleared.
    pub async fn delete(&self, data: &mut ResourceData) -> Result<()> {
        let id = data.object_id()?;
        let object = ObjectRef::new(R::KIND, &id.namespace, &id.name);
        tracing::info!(kind = R::KIND, id = %id, "deleting resource");

        match self.client.delete(&id.namespace, &id.name).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::info!(kind = R::KIND, id = %id, "resource already gone");
                data.clear_id();
                return Ok(());
            }
            Err(e) => return Err(ReconcileError::store(&object, Operation::Delete, e)),
        }

        let wait = StateWait {
            pending: DELETE_PENDING,
            target: &[],
            timeout: data.timeouts().delete,
            interval: self.poll_interval,
        };
        let client = &self.client;
        let (object_ref, id_ref) = (&object, &id);
        let mut cancel = self.cancel.clone();
        wait.run(&object, Operation::Delete, &mut cancel, move || {
            observe_deletion(client, object_ref, id_ref)
        })
        .await?;

        data.clear_id();
        tracing::info!(kind = R::KIND, id = %id, "resource deleted");
        Ok(())
    }

    /// Reports whether the tracked object still exists.
    ///
    /// Absence is `(false, None)`. Any other failure reports `true` together
    /// with the error, since the object may well exist. A malformed identity
    /// reports `(false, Some(err))` without touching the store.
    pub async fn exists(&self, data: &ResourceData) -> (bool, Option<ReconcileError>) {
        let id = match data.object_id() {
            Ok(id) => id,
            Err(e) => return (false, Some(e)),
        };
        match self.client.get(&id.namespace, &id.name).await {
            Ok(_) => (true, None),
            Err(e) if e.is_not_found() => (false, None),
            Err(e) => {
                let object = ObjectRef::new(R::KIND, &id.namespace, &id.name);
                (true, Some(ReconcileError::store(&object, Operation::Exists, e)))
            }
        }
    }

    /// Starts tracking an existing object: reads it and adopts the
    /// flattened snapshot as the desired configuration.
    pub async fn import(&self, id: &str) -> Result<ResourceData> {
        let mut data = ResourceData::from_id(id);
        self.read_as(&mut data, Operation::Import).await?;
        if let Some(state) = data.state().cloned() {
            data.set_config(state);
        }
        tracing::info!(kind = R::KIND, id, "resource imported");
        Ok(data)
    }
}

async fn observe_creation<R: Resource>(
    client: &ResourceClient<R>,
    object: &ObjectRef,
    id: &ObjectId,
) -> Result<Observation<R>> {
    match client.get(&id.namespace, &id.name).await {
        Ok(obj) => match obj.readiness() {
            Readiness::Failed { reason, message } => {
                Err(ReconcileError::failed(object, reason, message))
            }
            readiness => Ok(Observation::found(
                LifecycleState::from_readiness(&readiness),
                obj,
            )),
        },
        Err(e) if e.is_not_found() => {
            tracing::debug!(kind = R::KIND, id = %id, "resource not visible yet");
            Ok(Observation::absent(LifecycleState::Creating))
        }
        Err(e) => Err(ReconcileError::store(object, Operation::Create, e)),
    }
}

async fn observe_deletion<R: Resource>(
    client: &ResourceClient<R>,
    object: &ObjectRef,
    id: &ObjectId,
) -> Result<Observation<R>> {
    match client.get(&id.namespace, &id.name).await {
        Ok(obj) => {
            tracing::debug!(kind = R::KIND, id = %id, "resource is being deleted");
            Ok(Observation::found(LifecycleState::Deleting, obj))
        }
        Err(e) if e.is_not_found() => Ok(Observation::absent(LifecycleState::Deleted)),
        Err(e) => Err(ReconcileError::store(object, Operation::Delete, e)),
    }
}
