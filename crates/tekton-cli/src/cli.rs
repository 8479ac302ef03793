use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "tekton-reconcile")]
#[command(about = "Reconcile Tekton tasks, pipelines and their runs from configuration files")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the TOML settings file (defaults to ./tekton.toml when present)
    #[arg(short, long, global = true, env = "TEKTON_CONFIG")]
    pub config: Option<String>,

    /// API server URL (overrides store.endpoint)
    #[arg(short, long, global = true, env = "TEKTON_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Bearer token for the API server (overrides store.token)
    #[arg(long, global = true, env = "TEKTON_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Namespace for objects that do not set one (overrides defaults.namespace)
    #[arg(short, long, global = true, env = "TEKTON_NAMESPACE")]
    pub namespace: Option<String>,

    /// Log level or filter directive (RUST_LOG wins when set)
    #[arg(long, global = true, env = "TEKTON_LOG")]
    pub log_level: Option<String>,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

/// Resource kinds the host can reconcile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KindArg {
    Task,
    TaskRun,
    Pipeline,
    PipelineRun,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the object described by a configuration file, or update it
    /// when the state file already tracks it
    Apply(ApplyArgs),
    /// Refresh the state file from the API server and print it
    Get(StateArgs),
    /// Delete the tracked object and wait until it is gone
    Delete(StateArgs),
    /// Check whether the tracked object still exists
    Exists(StateArgs),
    /// Start tracking an object that already exists
    Import(ImportArgs),
}

#[derive(clap::Args)]
pub struct ApplyArgs {
    /// Kind of the configured object
    #[arg(short, long)]
    pub kind: KindArg,
    /// Configuration file (YAML or JSON)
    #[arg(long)]
    pub file: PathBuf,
    /// State file holding identity and last observed snapshot
    #[arg(long)]
    pub state: PathBuf,
}

#[derive(clap::Args)]
pub struct StateArgs {
    /// State file written by apply or import
    #[arg(long)]
    pub state: PathBuf,
}

#[derive(clap::Args)]
pub struct ImportArgs {
    /// Kind of the existing object
    #[arg(short, long)]
    pub kind: KindArg,
    /// Identity in <namespace>/<name> form
    pub id: String,
    /// State file to create
    #[arg(long)]
    pub state: PathBuf,
}
