//! Access to the remote resource store.
//!
//! [`ResourceStore`] is the untyped, single-shot primitive; [`ResourceClient`]
//! layers typed CRUD for one kind on top of it. Two backends are provided:
//! [`KubeStore`] speaks the Kubernetes REST API and [`InMemoryStore`] keeps
//! objects in process.

pub mod client;
pub mod error;
pub mod kube;
pub mod memory;
pub mod traits;

pub use client::ResourceClient;
pub use error::{ErrorCategory, StoreError};
pub use kube::{JSON_PATCH_CONTENT_TYPE, KubeStore, KubeStoreOptions};
pub use memory::InMemoryStore;
pub use traits::ResourceStore;
