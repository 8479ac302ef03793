//! Engine behavior against a store whose `get` answers follow a script.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tekton_core::{GroupVersionResource, ResourceCoordinate};
use tekton_reconciler::{
    ErrorCategory, Operation, ProviderConfig, ReconcileError, Reconciler, ResourceData, Timeouts,
};
use tekton_schema::{ConfigMap, Task, TaskRun};
use tekton_storage::{ResourceStore, StoreError};
use tokio::sync::watch;
use tokio::time::Instant;

#[derive(Debug, Clone)]
enum Reply {
    Object(Value),
    NotFound,
    Fail(u16, &'static str),
    Unreachable(&'static str),
}

/// Store double: `get` pops scripted replies, then repeats `steady`.
struct ScriptedStore {
    script: Mutex<VecDeque<Reply>>,
    steady: Reply,
    gets: AtomicUsize,
    created: Mutex<Vec<Value>>,
    patches: Mutex<Vec<Value>>,
    deletes: AtomicUsize,
    create_reply: Option<Reply>,
    delete_reply: Option<Reply>,
}

impl ScriptedStore {
    fn new(script: Vec<Reply>, steady: Reply) -> Self {
        Self {
            script: Mutex::new(script.into()),
            steady,
            gets: AtomicUsize::new(0),
            created: Mutex::new(Vec::new()),
            patches: Mutex::new(Vec::new()),
            deletes: AtomicUsize::new(0),
            create_reply: None,
            delete_reply: None,
        }
    }

    fn rejecting_create(mut self, status: u16, message: &'static str) -> Self {
        self.create_reply = Some(Reply::Fail(status, message));
        self
    }

    fn rejecting_delete(mut self, reply: Reply) -> Self {
        self.delete_reply = Some(reply);
        self
    }

    fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    fn patches(&self) -> Vec<Value> {
        self.patches.lock().unwrap().clone()
    }

    fn answer(reply: Reply, coordinate: &ResourceCoordinate) -> Result<Value, StoreError> {
        match reply {
            Reply::Object(value) => Ok(value),
            Reply::NotFound => Err(StoreError::not_found(coordinate)),
            Reply::Fail(status, message) => Err(StoreError::request(status, message)),
            Reply::Unreachable(message) => Err(StoreError::client(message)),
        }
    }
}

#[async_trait]
impl ResourceStore for ScriptedStore {
    async fn get(&self, coordinate: &ResourceCoordinate) -> Result<Value, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.steady.clone());
        Self::answer(reply, coordinate)
    }

    async fn create(
        &self,
        gvr: &GroupVersionResource,
        namespace: &str,
        body: &Value,
    ) -> Result<Value, StoreError> {
        if let Some(Reply::Fail(status, message)) = &self.create_reply {
            return Err(StoreError::request(*status, *message));
        }
        let mut stored = body.clone();
        stored["metadata"]["namespace"] = json!(namespace);
        stored["metadata"]["uid"] = json!(format!("uid-{}", gvr.resource));
        stored["metadata"]["resourceVersion"] = json!("1");
        self.created.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn patch(&self, coordinate: &ResourceCoordinate, patch: &[u8]) -> Result<Value, StoreError> {
        self.patches
            .lock()
            .unwrap()
            .push(serde_json::from_slice(patch)?);
        Ok(json!({"metadata": {"name": coordinate.name, "namespace": coordinate.namespace}}))
    }

    async fn delete(&self, coordinate: &ResourceCoordinate) -> Result<(), StoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        match self.delete_reply.clone() {
            Some(reply) => Self::answer(reply, coordinate).map(|_| ()),
            None => Ok(()),
        }
    }

    fn backend_name(&self) -> &'static str {
        "scripted"
    }
}

fn task_run(conditions: Value) -> Value {
    json!({
        "apiVersion": "tekton.dev/v1alpha1",
        "kind": "TaskRun",
        "metadata": {"name": "build-1", "namespace": "ci", "uid": "u1", "resourceVersion": "7"},
        "spec": {"taskRef": {"name": "build"}},
        "status": {"conditions": conditions}
    })
}

fn succeeded(status: &str, reason: &str, message: &str) -> Value {
    json!([{"type": "Succeeded", "status": status, "reason": reason, "message": message}])
}

fn tree(value: Value) -> ConfigMap {
    serde_json::from_value(value).unwrap()
}

fn run_config() -> ConfigMap {
    tree(json!({
        "metadata": {"name": "build-1", "namespace": "ci"},
        "spec": {"task_ref": {"name": "build"}}
    }))
}

fn short_timeouts() -> Timeouts {
    Timeouts {
        create: Duration::from_secs(2),
        delete: Duration::from_secs(2),
    }
}

fn reconciler<R: tekton_schema::Kind>(store: &Arc<ScriptedStore>) -> Reconciler<R> {
    let store: Arc<dyn ResourceStore> = store.clone();
    Reconciler::new(store, &ProviderConfig::default()).with_poll_interval(Duration::from_millis(500))
}

#[tokio::test(start_paused = true)]
async fn create_times_out_when_run_never_finishes() {
    let store = Arc::new(ScriptedStore::new(vec![], Reply::Object(task_run(json!([])))));
    let mut data = ResourceData::new(run_config()).with_timeouts(short_timeouts());

    let started = Instant::now();
    let err = reconciler::<TaskRun>(&store).create(&mut data).await.unwrap_err();
    let elapsed = started.elapsed();

    assert!(err.is_timeout(), "unexpected error: {err}");
    assert!(elapsed >= Duration::from_secs(2));
    assert!(elapsed <= Duration::from_millis(2500));
    assert_eq!(store.gets(), 5);
    // The object was accepted, so it stays tracked.
    assert_eq!(data.id(), "ci/build-1");
}

#[tokio::test(start_paused = true)]
async fn create_waits_through_invisibility_and_unknown_condition() {
    let store = Arc::new(ScriptedStore::new(
        vec![
            Reply::NotFound,
            Reply::Object(task_run(succeeded("Unknown", "Running", "step 1 of 2"))),
        ],
        Reply::Object(task_run(succeeded("True", "Succeeded", "All steps completed"))),
    ));
    let mut data = ResourceData::new(run_config()).with_timeouts(short_timeouts());

    reconciler::<TaskRun>(&store).create(&mut data).await.unwrap();

    assert_eq!(store.gets(), 3);
    assert_eq!(data.id(), "ci/build-1");
    let status = data.state().unwrap()["status"].as_map().unwrap();
    let conditions = status["conditions"].as_list().unwrap();
    assert_eq!(
        conditions[0].as_map().unwrap()["reason"].as_str(),
        Some("Succeeded")
    );
}

#[tokio::test(start_paused = true)]
async fn create_fails_on_false_condition() {
    let store = Arc::new(ScriptedStore::new(
        vec![],
        Reply::Object(task_run(succeeded("False", "TaskRunImagePullFailed", "image not found"))),
    ));
    let mut data = ResourceData::new(run_config()).with_timeouts(short_timeouts());

    let err = reconciler::<TaskRun>(&store).create(&mut data).await.unwrap_err();
    match err {
        ReconcileError::Failed { reason, message, .. } => {
            assert_eq!(reason, "TaskRunImagePullFailed");
            assert_eq!(message, "image not found");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.gets(), 1);
}

#[tokio::test(start_paused = true)]
async fn create_aborts_on_hard_poll_error() {
    let store = Arc::new(ScriptedStore::new(vec![], Reply::Fail(500, "etcd unavailable")));
    let mut data = ResourceData::new(run_config()).with_timeouts(short_timeouts());

    let err = reconciler::<TaskRun>(&store).create(&mut data).await.unwrap_err();
    assert!(matches!(err, ReconcileError::Store { operation: Operation::Create, .. }));
    assert_eq!(err.category(), ErrorCategory::Rejected);
    assert_eq!(store.gets(), 1);
}

#[tokio::test]
async fn create_definition_kind_is_ready_once_visible() {
    let task = json!({
        "metadata": {"name": "build", "namespace": "ci"},
        "spec": {"steps": [{"name": "compile", "image": "rust:1.85"}]}
    });
    let store = Arc::new(ScriptedStore::new(vec![Reply::NotFound], Reply::Object(task)));
    let mut data = ResourceData::new(tree(json!({
        "metadata": {"name": "build", "namespace": "ci"},
        "spec": {"steps": [{"name": "compile", "image": "rust:1.85"}]}
    })));

    reconciler::<Task>(&store)
        .with_poll_interval(Duration::from_millis(5))
        .create(&mut data)
        .await
        .unwrap();
    assert_eq!(store.gets(), 2);

    let created = store.created.lock().unwrap()[0].clone();
    assert_eq!(created["apiVersion"], "tekton.dev/v1");
    assert_eq!(created["kind"], "Task");
}

#[tokio::test]
async fn create_rejection_leaves_data_untracked() {
    let store = Arc::new(
        ScriptedStore::new(vec![], Reply::NotFound)
            .rejecting_create(422, "spec.taskRef: Required value"),
    );
    let mut data = ResourceData::new(run_config());

    let err = reconciler::<TaskRun>(&store).create(&mut data).await.unwrap_err();
    assert!(err.to_string().contains("spec.taskRef: Required value"));
    assert_eq!(data.id(), "");
    assert_eq!(store.gets(), 0);
}

#[tokio::test(start_paused = true)]
async fn create_is_cancellable() {
    let store = Arc::new(ScriptedStore::new(vec![], Reply::Object(task_run(json!([])))));
    let mut data = ResourceData::new(run_config()).with_timeouts(short_timeouts());
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(800)).await;
        let _ = tx.send(true);
    });

    let err = reconciler::<TaskRun>(&store)
        .with_cancellation(rx)
        .create(&mut data)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(store.gets(), 2);
}

#[tokio::test(start_paused = true)]
async fn delete_completes_after_exactly_two_ticks() {
    let store = Arc::new(ScriptedStore::new(
        vec![Reply::Object(task_run(json!([]))), Reply::NotFound],
        Reply::Fail(500, "should not be reached"),
    ));
    let mut data = ResourceData::from_id("ci/build-1").with_timeouts(short_timeouts());
    data.set_state(run_config());

    reconciler::<TaskRun>(&store).delete(&mut data).await.unwrap();

    assert_eq!(store.gets(), 2);
    assert_eq!(store.deletes.load(Ordering::SeqCst), 1);
    assert_eq!(data.id(), "");
    assert!(data.state().is_none());
}

#[tokio::test(start_paused = true)]
async fn delete_times_out_while_object_lingers() {
    let store = Arc::new(ScriptedStore::new(vec![], Reply::Object(task_run(json!([])))));
    let mut data = ResourceData::from_id("ci/build-1").with_timeouts(short_timeouts());

    let err = reconciler::<TaskRun>(&store).delete(&mut data).await.unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(data.id(), "ci/build-1");
}

#[tokio::test]
async fn delete_of_missing_object_succeeds() {
    let store = Arc::new(ScriptedStore::new(vec![], Reply::NotFound).rejecting_delete(Reply::NotFound));
    let mut data = ResourceData::from_id("ci/build-1");

    reconciler::<TaskRun>(&store).delete(&mut data).await.unwrap();
    assert_eq!(data.id(), "");
    assert_eq!(store.gets(), 0);
}

#[tokio::test]
async fn delete_rejection_is_reported() {
    let store = Arc::new(
        ScriptedStore::new(vec![], Reply::NotFound).rejecting_delete(Reply::Fail(422, "admission webhook denied the request")),
    );
    let mut data = ResourceData::from_id("ci/build-1");

    let err = reconciler::<TaskRun>(&store).delete(&mut data).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Rejected);
    assert_eq!(data.id(), "ci/build-1");
}

#[tokio::test]
async fn exists_reports_three_outcomes() {
    let store = Arc::new(ScriptedStore::new(
        vec![
            Reply::NotFound,
            Reply::Object(task_run(json!([]))),
            Reply::Unreachable("connection refused"),
        ],
        Reply::NotFound,
    ));
    let reconciler = reconciler::<TaskRun>(&store);
    let data = ResourceData::from_id("ci/build-1");

    let (exists, err) = reconciler.exists(&data).await;
    assert!(!exists);
    assert!(err.is_none());

    let (exists, err) = reconciler.exists(&data).await;
    assert!(exists);
    assert!(err.is_none());

    let (exists, err) = reconciler.exists(&data).await;
    assert!(exists);
    let err = err.unwrap();
    assert!(matches!(
        err,
        ReconcileError::Store { operation: Operation::Exists, source: StoreError::Client { .. }, .. }
    ));
    assert!(!err.is_not_found());
    assert_eq!(err.category(), ErrorCategory::Infrastructure);
}

#[tokio::test]
async fn read_propagates_not_found() {
    let store = Arc::new(ScriptedStore::new(vec![], Reply::NotFound));
    let mut data = ResourceData::from_id("ci/build-1");

    let err = reconciler::<TaskRun>(&store).read(&mut data).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(data.state().is_none());
}

#[tokio::test]
async fn update_diffs_against_snapshot() {
    let store = Arc::new(ScriptedStore::new(vec![], Reply::Object(task_run(json!([])))));
    let mut data = ResourceData::from_id("ci/build-1");
    data.set_state(tree(json!({
        "metadata": {"name": "build-1", "namespace": "ci", "labels": {"team": "a"}},
        "spec": {"task_ref": {"name": "build"}, "service_account_name": "builder"}
    })));
    data.set_config(tree(json!({
        "metadata": {"name": "build-1", "namespace": "ci", "labels": {"team": "b"}},
        "spec": {"task_ref": {"name": "build"}, "service_account_name": "builder"}
    })));

    reconciler::<TaskRun>(&store).update(&mut data).await.unwrap();

    assert_eq!(
        store.patches(),
        vec![json!([{"op": "replace", "path": "/metadata/labels/team", "value": "b"}])]
    );
    // Read-back replaces the snapshot with what the store returned.
    assert_eq!(store.gets(), 1);
    let state = data.state().unwrap();
    assert!(state["metadata"].as_map().unwrap().get("labels").is_none());
}

#[tokio::test]
async fn update_without_snapshot_reasserts_everything() {
    let store = Arc::new(ScriptedStore::new(vec![], Reply::Object(task_run(json!([])))));
    let mut data = ResourceData::from_id("ci/build-1");
    data.set_config(tree(json!({
        "metadata": {"name": "build-1", "namespace": "ci", "labels": {"team": "b"}},
        "spec": {"task_ref": {"name": "build"}, "service_account_name": "builder"}
    })));

    reconciler::<TaskRun>(&store).update(&mut data).await.unwrap();

    let patches = store.patches();
    assert_eq!(patches.len(), 1);
    let ops = patches[0].as_array().unwrap();
    let paths: Vec<&str> = ops.iter().map(|op| op["path"].as_str().unwrap()).collect();
    assert!(paths.contains(&"/metadata/labels"));
    assert!(paths.contains(&"/spec/taskRef"));
    assert!(paths.contains(&"/spec/serviceAccountName"));
    assert!(ops.iter().all(|op| op["op"] == "add"));
}

#[tokio::test]
async fn update_without_changes_skips_patch() {
    let store = Arc::new(ScriptedStore::new(vec![], Reply::Object(task_run(json!([])))));
    let mut data = ResourceData::from_id("ci/build-1");
    data.set_state(run_config());
    data.set_config(run_config());

    reconciler::<TaskRun>(&store).update(&mut data).await.unwrap();
    assert!(store.patches().is_empty());
    assert_eq!(store.gets(), 1);
}
