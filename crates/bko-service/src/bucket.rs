use std::sync::Arc;

use bko_store::ObjectRegistry;
use tracing::error;

use crate::context::RequestContext;
use crate::descriptor::ObjectDescriptor;
use crate::error::{ServiceError, ServiceResult};

/// Object operations over a shared registry.
///
/// Holds nothing but the registry handle; every method is a single
/// call-through. Registry errors are returned unchanged.
#[derive(Clone)]
pub struct BucketService {
    registry: Arc<dyn ObjectRegistry>,
}

impl BucketService {
    pub fn new(registry: Arc<dyn ObjectRegistry>) -> Self {
        Self { registry }
    }

    /// Record `object` in `bucket`.
    pub fn upload_object(
        &self,
        ctx: &RequestContext,
        bucket: &str,
        object: &str,
    ) -> ServiceResult<ObjectDescriptor> {
        check_deadline(ctx)?;
        self.registry
            .insert_object(bucket, object)
            .map_err(|e| log_failure(ctx, "error inserting object", e.into()))?;
        Ok(ObjectDescriptor::new(object))
    }

    /// Look up `object` in `bucket`.
    pub fn fetch_object(
        &self,
        ctx: &RequestContext,
        bucket: &str,
        object: &str,
    ) -> ServiceResult<ObjectDescriptor> {
        check_deadline(ctx)?;
        let id = self
            .registry
            .get_object(bucket, object)
            .map_err(|e| log_failure(ctx, "error getting object", e.into()))?;
        Ok(ObjectDescriptor::new(id))
    }

    /// Remove `object` from `bucket`.
    pub fn delete_object(
        &self,
        ctx: &RequestContext,
        bucket: &str,
        object: &str,
    ) -> ServiceResult<()> {
        check_deadline(ctx)?;
        self.registry
            .remove_object(bucket, object)
            .map_err(|e| log_failure(ctx, "error removing object", e.into()))
    }
}

impl std::fmt::Debug for BucketService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BucketService").finish_non_exhaustive()
    }
}

fn check_deadline(ctx: &RequestContext) -> ServiceResult<()> {
    if ctx.is_expired() {
        return Err(log_failure(
            ctx,
            "request expired before reaching the registry",
            ServiceError::DeadlineExceeded,
        ));
    }
    Ok(())
}

fn log_failure(ctx: &RequestContext, message: &str, err: ServiceError) -> ServiceError {
    error!(trace_id = %ctx.trace_id(), error = %err, "{message}");
    err
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use bko_store::{InMemoryRegistry, RegistryError, RegistryResult};

    use super::*;

    fn service() -> BucketService {
        BucketService::new(Arc::new(InMemoryRegistry::new()))
    }

    #[test]
    fn upload_returns_descriptor() {
        let svc = service();
        let ctx = RequestContext::new();
        let desc = svc.upload_object(&ctx, "b1", "o1").unwrap();
        assert_eq!(desc, ObjectDescriptor::new("o1"));
    }

    #[test]
    fn fetch_after_upload() {
        let svc = service();
        let ctx = RequestContext::new();
        svc.upload_object(&ctx, "b1", "o1").unwrap();
        assert_eq!(svc.fetch_object(&ctx, "b1", "o1").unwrap().id, "o1");
    }

    #[test]
    fn fetch_propagates_registry_errors_verbatim() {
        let svc = service();
        let ctx = RequestContext::new();
        assert_eq!(
            svc.fetch_object(&ctx, "b1", "o1").unwrap_err(),
            ServiceError::Registry(RegistryError::BucketNotFound {
                bucket: "b1".into()
            })
        );

        svc.upload_object(&ctx, "b1", "o1").unwrap();
        let err = svc.fetch_object(&ctx, "b1", "o2").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "no object found: o2 in bucket b1");
    }

    #[test]
    fn delete_then_fetch() {
        let svc = service();
        let ctx = RequestContext::new();
        svc.upload_object(&ctx, "b1", "o1").unwrap();
        svc.delete_object(&ctx, "b1", "o1").unwrap();
        assert_eq!(
            svc.fetch_object(&ctx, "b1", "o1").unwrap_err(),
            ServiceError::Registry(RegistryError::ObjectNotFound {
                bucket: "b1".into(),
                object: "o1".into()
            })
        );
    }

    #[test]
    fn delete_unknown_bucket() {
        let svc = service();
        let err = svc
            .delete_object(&RequestContext::new(), "nope", "o1")
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Registry(RegistryError::BucketNotFound { .. })
        ));
    }

    #[test]
    fn expired_context_is_rejected_before_the_registry() {
        let svc = service();
        let expired = RequestContext::new().with_deadline(Instant::now());
        assert_eq!(
            svc.upload_object(&expired, "b1", "o1").unwrap_err(),
            ServiceError::DeadlineExceeded
        );
        // Nothing was written.
        let err = svc
            .fetch_object(&RequestContext::new(), "b1", "o1")
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Registry(RegistryError::BucketNotFound { .. })
        ));
    }

    struct FailingRegistry;

    impl ObjectRegistry for FailingRegistry {
        fn insert_object(&self, _: &str, _: &str) -> RegistryResult<()> {
            Err(RegistryError::LockPoisoned)
        }

        fn get_object(&self, _: &str, _: &str) -> RegistryResult<String> {
            Err(RegistryError::LockPoisoned)
        }

        fn remove_object(&self, _: &str, _: &str) -> RegistryResult<()> {
            Err(RegistryError::LockPoisoned)
        }
    }

    #[test]
    fn upload_propagates_insert_failure() {
        let svc = BucketService::new(Arc::new(FailingRegistry));
        let err = svc
            .upload_object(&RequestContext::new(), "b1", "o1")
            .unwrap_err();
        assert_eq!(err, ServiceError::Registry(RegistryError::LockPoisoned));
        assert!(!err.is_not_found());
    }
}
