//! Per-object state the host keeps between operations.

use serde::{Deserialize, Serialize};
use tekton_core::ObjectId;
use tekton_schema::ConfigMap;

use crate::config::Timeouts;
use crate::error::Result;

/// Identity, desired configuration and last observed snapshot of one object.
///
/// `config` is what the host wants. `state` is the tree flattened from the
/// last object the store returned; updates diff `config` against it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceData {
    #[serde(default)]
    id: String,
    #[serde(default)]
    config: ConfigMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    state: Option<ConfigMap>,
    #[serde(default)]
    timeouts: Timeouts,
}

impl ResourceData {
    pub fn new(config: ConfigMap) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Data for an object that exists remotely but is not yet tracked.
    pub fn from_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Parses the identity back into namespace and name.
    pub fn object_id(&self) -> Result<ObjectId> {
        Ok(ObjectId::parse(&self.id)?)
    }

    /// Forgets the remote object: identity and snapshot are dropped, the
    /// desired configuration stays.
    pub fn clear_id(&mut self) {
        self.id.clear();
        self.state = None;
    }

    pub fn config(&self) -> &ConfigMap {
        &self.config
    }

    pub fn set_config(&mut self, config: ConfigMap) {
        self.config = config;
    }

    pub fn state(&self) -> Option<&ConfigMap> {
        self.state.as_ref()
    }

    pub fn set_state(&mut self, state: ConfigMap) {
        self.state = Some(state);
    }

    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    pub fn set_timeouts(&mut self, timeouts: Timeouts) {
        self.timeouts = timeouts;
    }
}
