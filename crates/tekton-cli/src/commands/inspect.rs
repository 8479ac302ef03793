use std::path::Path;

use anyhow::{Context, Result, bail};
use colored::Colorize;
use tekton_schema::Kind;

use super::Session;
use crate::output::{print_value, print_warning};
use crate::state::StateFile;

pub async fn get<R: Kind>(session: &Session, mut state: StateFile, state_path: &Path) -> Result<()> {
    if state.data.id().is_empty() {
        bail!("State file does not track an object");
    }
    session
        .reconciler::<R>()
        .read(&mut state.data)
        .await
        .with_context(|| format!("Failed to read {} {}", R::KIND, state.data.id()))?;
    state.save(state_path)?;
    if let Some(snapshot) = state.data.state() {
        print_value(snapshot, session.format)?;
    }
    Ok(())
}

/// Prints whether the object exists. Absence is not an error.
pub async fn exists<R: Kind>(session: &Session, state: &StateFile) -> Result<bool> {
    let (exists, err) = session.reconciler::<R>().exists(&state.data).await;
    if let Some(err) = err {
        if exists {
            print_warning(&format!("{} may exist; the check failed", state.data.id()));
        }
        return Err(err).with_context(|| format!("Failed to check {} {}", R::KIND, state.data.id()));
    }
    if exists {
        println!("{} {} {}", R::KIND, state.data.id().cyan(), "exists".green());
    } else {
        println!("{} {} {}", R::KIND, state.data.id().cyan(), "does not exist".yellow());
    }
    Ok(exists)
}
