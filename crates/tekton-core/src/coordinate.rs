use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::ObjectId;

/// Group, version and plural resource name of one object kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupVersionResource {
    pub group: String,
    pub version: String,
    pub resource: String,
}

impl GroupVersionResource {
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            resource: resource.into(),
        }
    }

    /// `group/version`, or just `version` for the core group.
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

impl fmt::Display for GroupVersionResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}/{}", self.resource, self.group, self.version)
    }
}

/// Address of one remote object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceCoordinate {
    pub gvr: GroupVersionResource,
    pub namespace: String,
    pub name: String,
}

impl ResourceCoordinate {
    pub fn new(gvr: GroupVersionResource, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            gvr,
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn for_id(gvr: GroupVersionResource, id: &ObjectId) -> Self {
        Self::new(gvr, id.namespace.clone(), id.name.clone())
    }

    pub fn object_id(&self) -> ObjectId {
        ObjectId::new(self.namespace.clone(), self.name.clone())
    }
}

impl fmt::Display for ResourceCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.gvr, self.namespace, self.name)
    }
}
