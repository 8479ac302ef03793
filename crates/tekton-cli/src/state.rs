//! Configuration and state files on disk.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tekton_reconciler::ResourceData;
use tekton_schema::ConfigMap;

use crate::cli::KindArg;

/// What the host remembers about one object between invocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateFile {
    pub kind: KindArg,
    #[serde(flatten)]
    pub data: ResourceData,
}

impl StateFile {
    pub fn new(kind: KindArg, data: ResourceData) -> Self {
        Self { kind, data }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid state file: {}", path.display()))
    }

    /// Like [`StateFile::load`], but a missing file is `None`.
    pub fn load_optional(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("Failed to encode state")?;
        fs::write(path, content + "\n")
            .with_context(|| format!("Failed to write state file: {}", path.display()))
    }

    pub fn ensure_kind(&self, kind: KindArg) -> Result<()> {
        if self.kind != kind {
            bail!(
                "State file tracks a {:?}, not a {:?}",
                self.kind,
                kind
            );
        }
        Ok(())
    }
}

/// Reads a configuration tree. `.json` files are parsed as JSON, anything
/// else as YAML.
pub fn read_config(path: &Path) -> Result<ConfigMap> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration: {}", path.display()))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(&content).context("Invalid JSON configuration")
    } else {
        serde_yaml::from_str(&content).context("Invalid YAML configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tekton_schema::ConfigValue;

    #[test]
    fn test_state_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut data = ResourceData::from_id("ci/build");
        data.set_state(ConfigMap::from([(
            "spec".to_string(),
            ConfigValue::Map(ConfigMap::new()),
        )]));
        let state = StateFile::new(KindArg::TaskRun, data);
        state.save(&path).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["kind"], "task-run");
        assert_eq!(raw["id"], "ci/build");

        assert_eq!(StateFile::load(&path).unwrap(), state);
    }

    #[test]
    fn test_load_optional_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(StateFile::load_optional(&dir.path().join("none.json")).unwrap().is_none());
    }

    #[test]
    fn test_ensure_kind() {
        let state = StateFile::new(KindArg::Task, ResourceData::default());
        assert!(state.ensure_kind(KindArg::Task).is_ok());
        assert!(state.ensure_kind(KindArg::Pipeline).is_err());
    }

    #[test]
    fn test_read_config_yaml_and_json() {
        let mut yaml = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(yaml, "metadata:\n  name: build\nspec:\n  description: x").unwrap();
        let tree = read_config(yaml.path()).unwrap();
        assert_eq!(tree.keys().collect::<Vec<_>>(), ["metadata", "spec"]);

        let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(json, r#"{{"metadata": {{"name": "build"}}}}"#).unwrap();
        let tree = read_config(json.path()).unwrap();
        assert!(tree["metadata"].as_map().is_some());
    }
}
