use bko_store::RegistryError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("request deadline exceeded")]
    DeadlineExceeded,
}

impl ServiceError {
    /// Returns `true` for `BucketNotFound` and `ObjectNotFound`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Registry(e) if e.is_not_found())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
