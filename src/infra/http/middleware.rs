use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;

use super::{REQUEST_ID_HEADER, ServedPage};

const MAX_FORWARDED_ID_LEN: usize = 128;

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

/// Assign a request id (or adopt the caller's) and echo it on the response.
pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty() && value.len() <= MAX_FORWARDED_ID_LEN)
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request.extensions_mut().insert(RequestContext {
        request_id: request_id.clone(),
    });

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Log served pages at debug with their cache outcome, and failures at warn
/// (4xx) or error (5xx) with the diagnostics the handler attached.
pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();
    let started_at = Instant::now();

    let mut response = next.run(request).await;
    let status = response.status().as_u16();
    let elapsed_ms = started_at.elapsed().as_millis() as u64;

    if let Some(page) = response.extensions().get::<ServedPage>() {
        debug!(
            target = "sitecache::http::page",
            request_id = %request_id,
            method = %method,
            path = %path,
            status,
            key = %page.key,
            cache = %page.cache,
            elapsed_ms,
            "page served"
        );
        return response;
    }

    if status < 400 {
        return response;
    }

    let report = response.extensions_mut().remove::<ErrorReport>();
    let source = report.as_ref().map_or("router", |report| report.source);
    let detail = report
        .as_ref()
        .map_or("no diagnostic available", ErrorReport::detail);
    let key = report
        .as_ref()
        .and_then(|report| report.page_key.as_deref())
        .unwrap_or("-");
    let chain = report.as_ref().map(|report| report.chain.as_slice());

    if status >= 500 {
        error!(
            target = "sitecache::http::response",
            request_id = %request_id,
            method = %method,
            path = %path,
            status,
            key = %key,
            source,
            detail = %detail,
            chain = ?chain,
            elapsed_ms,
            "request failed"
        );
    } else {
        warn!(
            target = "sitecache::http::response",
            request_id = %request_id,
            method = %method,
            path = %path,
            status,
            key = %key,
            source,
            detail = %detail,
            elapsed_ms,
            "request rejected"
        );
    }

    response
}
