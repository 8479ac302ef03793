//! Tree form of object metadata.

use tekton_core::ObjectMeta;

use crate::fields::{ConfigBlock, FieldReader, FieldWriter, Result};
use crate::kinds::common::{timestamp, timestamp_string};
use crate::tree::ConfigMap;

// Server-populated fields are read back so that a flattened read
// round-trips; they are never sent on create.
impl ConfigBlock for ObjectMeta {
    fn expand(fields: &FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.string("name")?,
            generate_name: fields.string("generate_name")?,
            namespace: fields.string("namespace")?,
            labels: fields.string_map("labels")?,
            annotations: fields.string_map("annotations")?,
            uid: fields.string("uid")?,
            resource_version: fields.string("resource_version")?,
            generation: fields.int("generation")?,
            creation_timestamp: timestamp(fields, "creation_timestamp")?,
            deletion_timestamp: None,
        })
    }

    fn flatten(&self) -> ConfigMap {
        FieldWriter::new()
            .string("name", &self.name)
            .string("generate_name", &self.generate_name)
            .string("namespace", &self.namespace)
            .string_map("labels", &self.labels)
            .string_map("annotations", &self.annotations)
            .string("uid", &self.uid)
            .string("resource_version", &self.resource_version)
            .int("generation", self.generation)
            .string("creation_timestamp", &timestamp_string(self.creation_timestamp))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{expand, flatten};
    use serde_json::json;

    #[test]
    fn test_metadata_round_trip() {
        let tree: ConfigMap = serde_json::from_value(json!({
            "name": "build",
            "namespace": "ci",
            "labels": {"app": "builder"},
            "annotations": {"owner": "platform"},
            "uid": "4f1c",
            "resource_version": "17",
            "generation": 2,
            "creation_timestamp": "2024-05-15T14:30:00Z"
        }))
        .unwrap();
        let meta: ObjectMeta = expand(&tree).unwrap();
        assert_eq!(meta.generation, 2);
        assert_eq!(flatten(&meta), tree);
    }
}
