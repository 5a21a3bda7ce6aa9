//! Service layer for the bucket organizer.
//!
//! [`BucketService`] is a stateless pass-through over an
//! [`ObjectRegistry`](bko_store::ObjectRegistry): it forwards each call,
//! wraps successful lookups in an [`ObjectDescriptor`], and hands registry
//! errors back unchanged for the transport layer to render.

pub mod bucket;
pub mod context;
pub mod descriptor;
pub mod error;

pub use bucket::BucketService;
pub use context::RequestContext;
pub use descriptor::ObjectDescriptor;
pub use error::{ServiceError, ServiceResult};
