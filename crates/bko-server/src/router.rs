use std::time::Duration;

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::routing::get;
use axum::{middleware, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;

use crate::handler;
use crate::middleware::{panic_response, track_request, REQUEST_ID_HEADER, TRACE_ID_HEADER};
use crate::state::AppState;

/// Build the axum router with all endpoints and the middleware stack.
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    let routes = Router::new()
        .route(
            "/objects/:bucket_id/:object_id",
            get(handler::fetch_object)
                .put(handler::upload_object)
                .delete(handler::delete_object)
                .fallback(handler::method_not_allowed),
        )
        .route("/health", get(handler::health_handler))
        .route("/info", get(handler::info_handler))
        .fallback(handler::not_found)
        .with_state(state);

    with_middleware(routes, request_timeout)
}

/// Wrap `router` in the request pipeline, outermost first: request
/// tracking, panic recovery, CORS, `nosniff`, request timeout.
pub fn with_middleware(router: Router, request_timeout: Duration) -> Router {
    router
        .layer(TimeoutLayer::new(request_timeout))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(cors_layer())
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(request_timeout, track_request))
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_methods([
            Method::POST,
            Method::GET,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .expose_headers([
            HeaderName::from_static(REQUEST_ID_HEADER),
            HeaderName::from_static(TRACE_ID_HEADER),
        ])
        .allow_credentials(true)
}
