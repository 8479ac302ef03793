mod cli;
mod commands;
mod observability;
mod output;
mod state;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tekton_reconciler::config::loader;
use tekton_storage::{KubeStore, ResourceStore};
use tokio::sync::watch;

use cli::{Cli, Commands};
use commands::Session;
use output::print_error;
use state::StateFile;

#[tokio::main]
async fn main() {
    match run().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "command failed");
            print_error(&format!("{e:#}"));
            std::process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    let mut config = loader::load_config(cli.config.as_deref())
        .map_err(anyhow::Error::msg)
        .context("Failed to load configuration")?;
    if let Some(endpoint) = &cli.endpoint {
        config.store.endpoint = endpoint.clone();
    }
    if let Some(token) = &cli.token {
        config.store.token = Some(token.clone());
    }
    if let Some(namespace) = &cli.namespace {
        config.defaults.namespace = namespace.clone();
    }
    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("Invalid configuration")?;

    let level = cli.log_level.clone().unwrap_or_else(|| config.logging.level.clone());
    observability::init_tracing_with_level(&level);

    let store: Arc<dyn ResourceStore> = Arc::new(
        KubeStore::new(config.store_options()).context("Failed to set up the API client")?,
    );
    tracing::debug!(endpoint = %config.store.endpoint, backend = store.backend_name(), "store ready");

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling");
            let _ = cancel_tx.send(true);
        }
    });

    let session = Session {
        store,
        config,
        cancel: cancel_rx,
        format: cli.format.unwrap_or_default(),
    };

    match &cli.command {
        Commands::Apply(args) => {
            crate::with_kind!(args.kind, R => {
                commands::lifecycle::apply::<R>(&session, args.kind, &args.file, &args.state).await?
            });
        }
        Commands::Get(args) => {
            let state = StateFile::load(&args.state)?;
            crate::with_kind!(state.kind, R => {
                commands::inspect::get::<R>(&session, state, &args.state).await?
            });
        }
        Commands::Delete(args) => {
            let state = StateFile::load(&args.state)?;
            crate::with_kind!(state.kind, R => {
                commands::lifecycle::delete::<R>(&session, state, &args.state).await?
            });
        }
        Commands::Exists(args) => {
            let state = StateFile::load(&args.state)?;
            let exists = crate::with_kind!(state.kind, R => {
                commands::inspect::exists::<R>(&session, &state).await?
            });
            if !exists {
                return Ok(2);
            }
        }
        Commands::Import(args) => {
            crate::with_kind!(args.kind, R => {
                commands::lifecycle::import::<R>(&session, args.kind, &args.id, &args.state).await?
            });
        }
    }

    Ok(0)
}
