use tekton_schema::{
    ConfigMap, Pipeline, PipelineRun, Task, TaskRun, expand, flatten, validate,
};

fn load(yaml: &str) -> ConfigMap {
    serde_yaml::from_str(yaml).expect("fixture parses")
}

const TASK: &str = r#"
metadata:
  name: build
  namespace: ci
  labels:
    app.kubernetes.io/part-of: release
spec:
  display_name: Build
  description: Compile and package
  params:
    - name: revision
      type: string
      default:
        type: string
        string_val: main
    - name: flags
      type: array
      default:
        type: array
        array_val: ["--release", "--locked"]
  steps:
    - name: fetch
      image: alpine/git
      script: git checkout $(params.revision)
      workspaces:
        - name: source
          mount_path: /src
    - name: compile
      image: rust:1.85
      command: ["cargo"]
      args: ["build", "$(params.flags[*])"]
      working_dir: /src
      env:
        - name: CARGO_HOME
          value: /cache/cargo
      volume_mounts:
        - name: cache
          mount_path: /cache
          read_only: true
      on_error: stopAndFail
    - name: archive
      image: busybox
      timeout: 5m
  step_template:
    image_pull_policy: IfNotPresent
  sidecars:
    - name: registry
      image: registry:2
  workspaces:
    - name: source
      description: checked out sources
      optional: true
  results:
    - name: digest
      type: string
      description: image digest
"#;

const TASK_RUN: &str = r#"
metadata:
  name: build-run-1
  namespace: ci
spec:
  task_ref:
    name: build
  params:
    - name: revision
      value:
        type: string
        string_val: v1.2.0
    - name: settings
      value:
        type: object
        object_val:
          arch: arm64
  service_account_name: builder
  timeout: 1h
  workspaces:
    - name: source
      persistent_volume_claim:
        claim_name: sources
    - name: scratch
      empty_dir: {}
    - name: config
      config_map:
        name: build-config
    - name: creds
      secret:
        secret_name: registry-creds
"#;

const PIPELINE: &str = r#"
metadata:
  name: release
  namespace: ci
spec:
  description: Release train
  params:
    - name: revision
      type: string
  tasks:
    - name: fetch
      task_ref:
        name: git-clone
      workspaces:
        - name: output
          workspace: shared
    - name: build
      task_ref:
        name: build
      run_after: ["fetch"]
      params:
        - name: revision
          value:
            type: string
            string_val: $(params.revision)
      retries: 2
    - name: publish
      task_ref:
        name: publish
      run_after: ["build"]
      when:
        - input: $(params.revision)
          operator: notin
          values: ["main"]
  finally:
    - name: notify
      task_ref:
        name: notify
  workspaces:
    - name: shared
  results:
    - name: image
      type: string
      value:
        type: string
        string_val: $(tasks.build.results.digest)
"#;

const PIPELINE_RUN: &str = r#"
metadata:
  name: release-42
  namespace: ci
  annotations:
    triggered-by: tag
spec:
  pipeline_ref:
    name: release
  params:
    - name: revision
      value:
        type: string
        string_val: v1.2.0
  status: PipelineRunPending
  timeouts:
    pipeline: 2h
    finally: 10m
  task_run_template:
    service_account_name: releaser
  workspaces:
    - name: shared
      sub_path: release-42
      persistent_volume_claim:
        claim_name: shared
        read_only: true
"#;

#[test]
fn task_round_trip() {
    let tree = load(TASK);
    validate::<Task>(&tree).unwrap();
    let task: Task = expand(&tree).unwrap();
    assert_eq!(task.spec.steps.len(), 3);
    assert_eq!(flatten(&task), tree);
}

#[test]
fn task_run_round_trip() {
    let tree = load(TASK_RUN);
    validate::<TaskRun>(&tree).unwrap();
    let run: TaskRun = expand(&tree).unwrap();
    assert_eq!(run.spec.workspaces.len(), 4);
    assert_eq!(flatten(&run), tree);
}

#[test]
fn pipeline_round_trip() {
    let tree = load(PIPELINE);
    validate::<Pipeline>(&tree).unwrap();
    let pipeline: Pipeline = expand(&tree).unwrap();
    let names: Vec<&str> = pipeline.spec.tasks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["fetch", "build", "publish"]);
    assert_eq!(flatten(&pipeline), tree);
}

#[test]
fn pipeline_run_round_trip() {
    let tree = load(PIPELINE_RUN);
    validate::<PipelineRun>(&tree).unwrap();
    let run: PipelineRun = expand(&tree).unwrap();
    assert_eq!(flatten(&run), tree);
}

#[test]
fn wire_round_trip_preserves_domain_object() {
    let task: Task = expand(&load(TASK)).unwrap();
    let wire = serde_json::to_value(&task).unwrap();
    assert_eq!(wire["spec"]["steps"][1]["volumeMounts"][0]["readOnly"], true);
    assert_eq!(wire["spec"]["params"][1]["default"][0], "--release");

    let back: Task = serde_json::from_value(wire).unwrap();
    assert_eq!(back, task);
}
