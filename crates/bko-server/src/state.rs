use std::sync::Arc;

use bko_service::BucketService;

use crate::config::Environment;

/// Shared state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub service: Arc<BucketService>,
    pub service_name: Arc<str>,
    pub environment: Environment,
}

impl AppState {
    pub fn new(service: BucketService, service_name: &str, environment: Environment) -> Self {
        Self {
            service: Arc::new(service),
            service_name: service_name.into(),
            environment,
        }
    }
}
