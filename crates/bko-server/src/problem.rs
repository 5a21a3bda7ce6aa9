//! RFC 7807 problem details and the error type handlers return.

use axum::extract::path::ErrorKind;
use axum::extract::rejection::PathRejection;
use axum::http::{header, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bko_service::ServiceError;
use serde::{Deserialize, Serialize};

pub const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

const INTERNAL_DETAIL: &str = "internal server error";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub problem_type: String,
    pub title: String,
    pub detail: String,
    pub instance: String,
    #[serde(
        rename = "invalid-params",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub invalid_params: Vec<InvalidParam>,
    pub status: u16,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidParam {
    pub name: String,
    pub reason: String,
}

impl ProblemDetails {
    pub fn new(status: StatusCode, detail: impl Into<String>, instance: impl Into<String>) -> Self {
        Self {
            problem_type: "about:blank".into(),
            title: status.canonical_reason().unwrap_or("Unknown").into(),
            detail: detail.into(),
            instance: instance.into(),
            invalid_params: Vec::new(),
            status: status.as_u16(),
        }
    }

    pub fn internal(instance: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_DETAIL, instance)
    }

    /// Problem for path segments the router matched but could not decode.
    pub fn path_rejection(rejection: &PathRejection, instance: impl Into<String>) -> Self {
        let problem = Self::new(rejection.status(), rejection.body_text(), instance);
        match rejection {
            PathRejection::FailedToDeserializePathParams(err) => match err.kind() {
                ErrorKind::InvalidUtf8InPathParam { key } => {
                    problem.with_invalid_param(key.as_str(), "not valid UTF-8 after percent-decoding")
                }
                _ => problem,
            },
            _ => problem,
        }
    }

    pub fn with_invalid_param(mut self, name: impl Into<String>, reason: impl Into<String>) -> Self {
        self.invalid_params.push(InvalidParam {
            name: name.into(),
            reason: reason.into(),
        });
        self
    }

    /// Render and mark the response as a failed request for the logger.
    pub fn into_failure(self, message: &'static str) -> Response {
        let detail = self.detail.clone();
        let mut response = self.into_response();
        response
            .extensions_mut()
            .insert(RequestFailure { message, detail });
        response
    }

    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut response = (status, Json(self)).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(PROBLEM_CONTENT_TYPE),
        );
        response
    }
}

/// Attached to failed responses so the request logger can report why the
/// request failed without re-parsing the body.
#[derive(Clone, Debug)]
pub struct RequestFailure {
    pub message: &'static str,
    pub detail: String,
}

/// A service error bound to the request it failed.
#[derive(Debug)]
pub struct ApiError {
    error: ServiceError,
    message: &'static str,
    instance: String,
}

impl ApiError {
    pub fn new(error: ServiceError, message: &'static str, uri: &Uri) -> Self {
        Self {
            error,
            message,
            instance: uri.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match &self.error {
            e if e.is_not_found() => StatusCode::BAD_REQUEST,
            ServiceError::DeadlineExceeded => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.error.to_string();
        let problem = if status == StatusCode::INTERNAL_SERVER_ERROR {
            ProblemDetails::internal(self.instance)
        } else {
            ProblemDetails::new(status, detail.clone(), self.instance)
        };

        let mut response = problem.into_response();
        response.extensions_mut().insert(RequestFailure {
            message: self.message,
            detail,
        });
        response
    }
}
