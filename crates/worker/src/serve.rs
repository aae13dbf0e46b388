//! HTTP front-end for intercepted traffic.
//!
//! Every inbound request, whatever its path, is converted to a
//! `WorkerRequest` and resolved by the router. Rejections surface as gateway
//! errors: a fallback cache miss maps to 503, anything else to 502.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use skiff_core::{Error, WorkerRequest, WorkerResponse};

use crate::worker::Worker;

/// Largest request body the front-end will buffer for queueing.
const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// Build the interception router around a worker.
pub fn app(worker: Arc<Worker>) -> Router {
    Router::new().fallback(intercept).with_state(worker)
}

async fn intercept(State(worker): State<Arc<Worker>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => return plain(StatusCode::PAYLOAD_TOO_LARGE, "request body too large"),
    };

    let path = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/")
        .to_string();
    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let request = WorkerRequest {
        method: parts.method.as_str().to_string(),
        path,
        content_type,
        body: bytes.to_vec(),
        credentials: false,
    };

    match worker.handle_fetch(request).await {
        Ok(response) => into_http(response),
        Err(e) => plain(error_status(&e), &e.to_string()),
    }
}

fn error_status(error: &Error) -> StatusCode {
    match error {
        Error::NoCachedValue(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_GATEWAY,
    }
}

fn into_http(response: WorkerResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut builder = Response::builder().status(status);
    if let Some(content_type) = response.content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder
        .body(Body::from(response.body))
        .unwrap_or_else(|_| plain(StatusCode::BAD_GATEWAY, "response conversion failed"))
}

fn plain(status: StatusCode, message: &str) -> Response {
    Response::builder()
        .status(status)
        .body(Body::from(message.to_string()))
        .unwrap_or_default()
}
