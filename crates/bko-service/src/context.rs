use std::time::{Duration, Instant};

use uuid::Uuid;

/// Per-request tracing and cancellation context.
///
/// Every request gets a fresh time-ordered trace id. The request id is
/// whatever the caller sent in `X-Request-Id`, if anything. The deadline
/// is checked once, when a service operation starts; work in progress is
/// never interrupted.
#[derive(Clone, Debug)]
pub struct RequestContext {
    trace_id: Uuid,
    request_id: Option<String>,
    deadline: Option<Instant>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            trace_id: Uuid::now_v7(),
            request_id: None,
            deadline: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set the deadline to `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn trace_id(&self) -> Uuid {
        self.trace_id
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
