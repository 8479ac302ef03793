//! Reconciliation of Tekton resources against a remote store.
//!
//! A [`Reconciler`] drives one kind through create, read, update, delete,
//! exists and import. Create and delete poll the store through
//! [`StateWait`] until the object reaches its target phase, the deadline
//! passes or the caller cancels.

pub mod config;
pub mod engine;
pub mod error;
pub mod resource_data;
pub mod state;
pub mod wait;

pub use config::{ProviderConfig, Timeouts};
pub use engine::Reconciler;
pub use error::{ErrorCategory, ObjectRef, Operation, ReconcileError, Result};
pub use resource_data::ResourceData;
pub use state::LifecycleState;
pub use wait::{Cancellation, Observation, StateWait};
