use axum::async_trait;
use axum::extract::{FromRequestParts, Path, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderValue, Method, StatusCode, Uri};
use axum::response::{Json, Response};
use axum::Extension;
use bko_service::{ObjectDescriptor, RequestContext};
use serde::Serialize;
use serde_json::json;

use crate::problem::{ApiError, ProblemDetails};
use crate::state::AppState;

/// `:bucket_id/:object_id`. Undecodable segments are rejected as a 400
/// problem naming the offending parameter.
pub struct ObjectPath {
    pub bucket_id: String,
    pub object_id: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for ObjectPath
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path((bucket_id, object_id)) = Path::<(String, String)>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                ProblemDetails::path_rejection(&rejection, parts.uri.to_string())
                    .into_failure("invalid object path")
            })?;
        Ok(Self {
            bucket_id,
            object_id,
        })
    }
}

/// `PUT /objects/:bucket_id/:object_id`
pub async fn upload_object(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ObjectPath {
        bucket_id,
        object_id,
    }: ObjectPath,
    uri: Uri,
) -> Result<(StatusCode, Json<ObjectDescriptor>), ApiError> {
    let object = state
        .service
        .upload_object(&ctx, &bucket_id, &object_id)
        .map_err(|e| ApiError::new(e, "error while inserting object", &uri))?;
    Ok((StatusCode::CREATED, Json(object)))
}

/// `GET /objects/:bucket_id/:object_id`
pub async fn fetch_object(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ObjectPath {
        bucket_id,
        object_id,
    }: ObjectPath,
    uri: Uri,
) -> Result<Json<ObjectDescriptor>, ApiError> {
    let object = state
        .service
        .fetch_object(&ctx, &bucket_id, &object_id)
        .map_err(|e| ApiError::new(e, "error while getting object", &uri))?;
    Ok(Json(object))
}

/// `DELETE /objects/:bucket_id/:object_id`
pub async fn delete_object(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ObjectPath {
        bucket_id,
        object_id,
    }: ObjectPath,
    uri: Uri,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .delete_object(&ctx, &bucket_id, &object_id)
        .map_err(|e| ApiError::new(e, "error while deleting object", &uri))?;
    Ok(StatusCode::OK)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Health check handler.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Info handler.
pub async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "name": &*state.service_name,
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.environment,
    }))
}

pub async fn not_found(uri: Uri) -> ProblemDetails {
    ProblemDetails::new(StatusCode::NOT_FOUND, format!("no route for {}", uri.path()), uri.to_string())
}

/// Methods the object route does not serve.
pub async fn method_not_allowed(method: Method, uri: Uri) -> Response {
    let mut response = ProblemDetails::new(
        StatusCode::METHOD_NOT_ALLOWED,
        format!("method {method} not allowed on {}", uri.path()),
        uri.to_string(),
    )
    .into_failure("method not allowed");
    response
        .headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static("GET,HEAD,PUT,DELETE"));
    response
}
