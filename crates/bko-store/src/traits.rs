use crate::error::RegistryResult;

/// Bucket/object membership registry.
///
/// A bucket exists implicitly once an object has been inserted into it.
/// Implementations must satisfy these invariants:
/// - Operations on the same bucket/object pair are linearizable; a reader
///   never observes a half-applied insert or remove.
/// - Inserting an existing pair is a no-op that still succeeds.
/// - Expected misses are returned as [`RegistryError::BucketNotFound`] or
///   [`RegistryError::ObjectNotFound`], never as panics.
/// - No caller holds a reference into the backing structure between calls.
///
/// [`RegistryError::BucketNotFound`]: crate::RegistryError::BucketNotFound
/// [`RegistryError::ObjectNotFound`]: crate::RegistryError::ObjectNotFound
pub trait ObjectRegistry: Send + Sync {
    /// Record `object` as a member of `bucket`, creating the bucket if needed.
    fn insert_object(&self, bucket: &str, object: &str) -> RegistryResult<()>;

    /// Look up `object` in `bucket` and echo its key back.
    fn get_object(&self, bucket: &str, object: &str) -> RegistryResult<String>;

    /// Remove `object` from `bucket`.
    ///
    /// The bucket itself stays known after its last object is removed.
    fn remove_object(&self, bucket: &str, object: &str) -> RegistryResult<()>;

    /// Check membership without distinguishing the two miss kinds.
    fn contains_object(&self, bucket: &str, object: &str) -> RegistryResult<bool> {
        match self.get_object(bucket, object) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}
