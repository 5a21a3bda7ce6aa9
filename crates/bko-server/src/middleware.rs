use std::any::Any;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use bko_service::RequestContext;
use tracing::{error, info, info_span, Instrument};

use crate::problem::{ProblemDetails, RequestFailure};

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const TRACE_ID_HEADER: &str = "x-trace-id";

const PANIC_FAILURE: &str = "panic while handling request";

/// Builds the [`RequestContext`] for the request, logs its start and
/// completion, and echoes the trace id back in `x-trace-id`.
///
/// The deadline is `request_timeout` from arrival.
pub async fn track_request(
    State(request_timeout): State<Duration>,
    mut request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let headers = request.headers();
    let request_id = header_str(headers, REQUEST_ID_HEADER).map(str::to_owned);
    let real_ip = header_str(headers, "x-real-ip").map(str::to_owned);
    let user_agent = header_str(headers, header::USER_AGENT.as_str()).map(str::to_owned);
    let query = request.uri().query().map(str::to_owned);
    let instance = request.uri().to_string();
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string());

    let mut ctx = RequestContext::new().with_timeout(request_timeout);
    if let Some(id) = &request_id {
        ctx = ctx.with_request_id(id.clone());
    }
    let trace_id = ctx.trace_id();

    let span = info_span!(
        "http_request",
        %trace_id,
        method = %request.method(),
        path = %request.uri().path(),
    );
    request.extensions_mut().insert(ctx);

    async move {
        info!(
            request_id = request_id.as_deref(),
            query = query.as_deref(),
            remote_addr = remote_addr.as_deref(),
            real_ip = real_ip.as_deref(),
            user_agent = user_agent.as_deref(),
            "http request started"
        );

        let mut response = next.run(request).await;
        if response
            .extensions()
            .get::<RequestFailure>()
            .is_some_and(|failure| failure.message == PANIC_FAILURE)
        {
            response = with_panic_problem(response, instance);
        }
        let status = response.status().as_u16();
        let elapsed_secs = start.elapsed().as_secs_f64();

        match response.extensions().get::<RequestFailure>() {
            None => info!(status, elapsed_secs, "http request completed"),
            Some(failure) => error!(
                status,
                elapsed_secs,
                message = failure.message,
                error = %failure.detail,
                "http request completed"
            ),
        }

        if let Ok(value) = HeaderValue::from_str(&trace_id.to_string()) {
            response.headers_mut().insert(TRACE_ID_HEADER, value);
        }
        response
    }
    .instrument(span)
    .await
}

/// Renders a handler panic as a 500 problem. Used with
/// `tower_http::catch_panic::CatchPanicLayer::custom`.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_owned()
    } else {
        "unknown panic".to_owned()
    };

    // The panic layer cannot see the request; `track_request` fills in the
    // instance on the way out.
    let mut response = ProblemDetails::internal("").into_response();
    response.extensions_mut().insert(RequestFailure {
        message: PANIC_FAILURE,
        detail,
    });
    response
}

/// Replace the body of a panic response with one naming `instance`,
/// keeping status, headers and extensions.
fn with_panic_problem(response: Response, instance: String) -> Response {
    let (mut parts, _) = response.into_parts();
    let (_, body) = ProblemDetails::internal(instance).into_response().into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, body)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
}
