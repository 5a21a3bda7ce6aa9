/// Errors from registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No object was ever inserted under this bucket key.
    #[error("no bucket found: {bucket}")]
    BucketNotFound { bucket: String },

    /// The bucket exists but does not contain the object key.
    #[error("no object found: {object} in bucket {bucket}")]
    ObjectNotFound { bucket: String, object: String },

    /// A thread panicked while holding a registry lock.
    #[error("registry lock poisoned")]
    LockPoisoned,
}

impl RegistryError {
    pub(crate) fn bucket_not_found(bucket: &str) -> Self {
        Self::BucketNotFound {
            bucket: bucket.to_owned(),
        }
    }

    pub(crate) fn object_not_found(bucket: &str, object: &str) -> Self {
        Self::ObjectNotFound {
            bucket: bucket.to_owned(),
            object: object.to_owned(),
        }
    }

    /// Returns `true` for the client-input kinds (`BucketNotFound`,
    /// `ObjectNotFound`), `false` for internal faults.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::BucketNotFound { .. } | Self::ObjectNotFound { .. }
        )
    }
}

impl<T> From<std::sync::PoisonError<T>> for RegistryError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Self::LockPoisoned
    }
}

/// Result alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
