//! The `Resource` trait ties a typed domain object to its fixed API
//! coordinates and to the serde codec used on the wire.

use std::fmt::Debug;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::coordinate::GroupVersionResource;
use crate::meta::{ObjectMeta, TypeMeta};

/// Observable phase of a fetched object, as far as the object itself can tell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// The object reached its terminal, successful phase.
    Ready,
    /// The object exists but has not reached a terminal phase yet.
    Pending,
    /// The object reached a terminal, failed phase.
    Failed { reason: String, message: String },
}

pub trait Resource:
    Serialize + DeserializeOwned + Default + Clone + Debug + Send + Sync + 'static
{
    const KIND: &'static str;
    const GROUP: &'static str;
    const VERSION: &'static str;
    const PLURAL: &'static str;

    fn gvr() -> GroupVersionResource {
        GroupVersionResource::new(Self::GROUP, Self::VERSION, Self::PLURAL)
    }

    fn api_version() -> String {
        Self::gvr().api_version()
    }

    fn type_meta(&self) -> &TypeMeta;

    fn type_meta_mut(&mut self) -> &mut TypeMeta;

    fn metadata(&self) -> &ObjectMeta;

    fn metadata_mut(&mut self) -> &mut ObjectMeta;

    /// Overwrites `apiVersion`/`kind` with this kind's fixed values.
    fn stamp_type_meta(&mut self) {
        *self.type_meta_mut() = TypeMeta::new(Self::api_version(), Self::KIND);
    }

    /// Drops store-owned status. Kinds without a status have nothing to do.
    fn clear_status(&mut self) {}

    /// Stamps type meta and strips everything the store owns, leaving the
    /// object fit for submission as a new resource.
    fn prepare_for_create(&mut self) {
        self.stamp_type_meta();
        self.metadata_mut().clear_server_fields();
        self.clear_status();
    }

    /// Kinds without a status are ready as soon as they are visible.
    fn readiness(&self) -> Readiness {
        Readiness::Ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    struct Widget {
        #[serde(flatten)]
        type_meta: TypeMeta,
        #[serde(default)]
        metadata: ObjectMeta,
    }

    impl Resource for Widget {
        const KIND: &'static str = "Widget";
        const GROUP: &'static str = "example.dev";
        const VERSION: &'static str = "v1beta1";
        const PLURAL: &'static str = "widgets";

        fn type_meta(&self) -> &TypeMeta {
            &self.type_meta
        }
        fn type_meta_mut(&mut self) -> &mut TypeMeta {
            &mut self.type_meta
        }
        fn metadata(&self) -> &ObjectMeta {
            &self.metadata
        }
        fn metadata_mut(&mut self) -> &mut ObjectMeta {
            &mut self.metadata
        }
    }

    #[test]
    fn test_stamp_type_meta_overwrites_user_values() {
        let mut widget = Widget {
            type_meta: TypeMeta::new("bogus/v0", "Gadget"),
            ..Default::default()
        };
        widget.stamp_type_meta();
        assert_eq!(widget.type_meta.api_version, "example.dev/v1beta1");
        assert_eq!(widget.type_meta.kind, "Widget");
    }

    #[test]
    fn test_prepare_for_create_strips_server_fields() {
        let mut widget = Widget::default();
        widget.metadata = ObjectMeta::named("ns", "w");
        widget.metadata.uid = "abc".into();
        widget.metadata.resource_version = "7".into();
        widget.metadata.generation = 3;
        widget.prepare_for_create();
        assert_eq!(widget.metadata, ObjectMeta::named("ns", "w"));
        assert_eq!(widget.type_meta.kind, "Widget");
    }

    #[test]
    fn test_default_readiness() {
        assert_eq!(Widget::default().readiness(), Readiness::Ready);
        assert_eq!(Widget::gvr().resource, "widgets");
    }
}
