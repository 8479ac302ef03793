use std::path::Path;

use anyhow::{Context, Result, bail};
use colored::Colorize;
use tekton_reconciler::ResourceData;
use tekton_schema::Kind;

use super::Session;
use crate::cli::KindArg;
use crate::output::{print_success, print_warning};
use crate::state::{StateFile, read_config};

/// Creates the configured object, or updates it when `state_path` already
/// tracks one.
pub async fn apply<R: Kind>(
    session: &Session,
    kind: KindArg,
    file: &Path,
    state_path: &Path,
) -> Result<()> {
    let config = read_config(file)?;
    let reconciler = session.reconciler::<R>();

    let mut state = match StateFile::load_optional(state_path)? {
        Some(existing) => {
            existing.ensure_kind(kind)?;
            existing
        }
        None => StateFile::new(
            kind,
            ResourceData::default().with_timeouts(session.config.timeouts),
        ),
    };
    state.data.set_config(config);

    if state.data.id().is_empty() {
        let result = reconciler.create(&mut state.data).await;
        // An accepted object is tracked even if waiting for it failed.
        if !state.data.id().is_empty() {
            state.save(state_path)?;
        }
        result.with_context(|| format!("Failed to create {}", R::KIND))?;
        print_success(&format!("Created {} {}", R::KIND, state.data.id().cyan()));
    } else {
        reconciler
            .update(&mut state.data)
            .await
            .with_context(|| format!("Failed to update {} {}", R::KIND, state.data.id()))?;
        state.save(state_path)?;
        print_success(&format!("Updated {} {}", R::KIND, state.data.id().cyan()));
    }
    Ok(())
}

pub async fn delete<R: Kind>(session: &Session, mut state: StateFile, state_path: &Path) -> Result<()> {
    if state.data.id().is_empty() {
        print_warning("State file does not track an object; nothing to delete");
        return Ok(());
    }
    let id = state.data.id().to_string();
    session
        .reconciler::<R>()
        .delete(&mut state.data)
        .await
        .with_context(|| format!("Failed to delete {} {id}", R::KIND))?;
    state.save(state_path)?;
    print_success(&format!("Deleted {} {}", R::KIND, id.cyan()));
    Ok(())
}

pub async fn import<R: Kind>(session: &Session, kind: KindArg, id: &str, state_path: &Path) -> Result<()> {
    if let Some(existing) = StateFile::load_optional(state_path)?
        && !existing.data.id().is_empty()
    {
        bail!(
            "{} already tracks {}; delete it or choose another state file",
            state_path.display(),
            existing.data.id()
        );
    }
    let data = session
        .reconciler::<R>()
        .import(id)
        .await
        .with_context(|| format!("Failed to import {} {id}", R::KIND))?;
    StateFile::new(kind, data.with_timeouts(session.config.timeouts)).save(state_path)?;
    print_success(&format!("Imported {} {}", R::KIND, id.cyan()));
    Ok(())
}
