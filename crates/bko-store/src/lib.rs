//! Bucket/object membership registry for the bucket organizer.
//!
//! The registry tracks which object keys belong to which bucket key. It
//! stores identifiers only; there is no payload, metadata, or ordering.
//!
//! # Backends
//!
//! All backends implement the [`ObjectRegistry`] trait:
//!
//! - [`InMemoryRegistry`] -- lock-sharded `HashMap` of `HashSet`s
//!
//! # Design Rules
//!
//! 1. Buckets are implicit: created by their first insert, never deleted.
//! 2. Inserts are idempotent; a second remove reports `ObjectNotFound`.
//! 3. Misses are ordinary results, never panics.
//! 4. Unrelated buckets do not serialize behind a shared write lock.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{RegistryError, RegistryResult};
pub use memory::InMemoryRegistry;
pub use traits::ObjectRegistry;
