pub mod coordinate;
pub mod error;
pub mod id;
pub mod meta;
pub mod resource;
pub mod time;

pub use coordinate::{GroupVersionResource, ResourceCoordinate};
pub use error::{CoreError, ErrorCategory, Result};
pub use id::ObjectId;
pub use meta::{ObjectMeta, TypeMeta};
pub use resource::{Readiness, Resource};
pub use time::{Timestamp, now_utc};
