//! Administrative cache controls.
//!
//! Content-mutation workflows call these after writes so stale renders are
//! dropped immediately instead of waiting for their TTL.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};

use crate::{
    application::{error::HttpError, pages::PageService},
    cache::CacheStats,
    domain::sections::Section,
};

use super::middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct AdminState {
    pub pages: Arc<PageService>,
}

pub fn build_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/_health", get(health))
        .route("/cache/stats", get(cache_stats))
        .route("/cache/invalidate", post(invalidate_cache))
        .route("/cache/invalidate/prefix", post(invalidate_prefix))
        .route(
            "/cache/sections/{section}/invalidate",
            post(invalidate_section),
        )
        .route("/cache/keys/{*key}", delete(invalidate_key))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Deserialize)]
struct InvalidatePrefixRequest {
    prefix: String,
}

#[derive(Debug, Serialize)]
struct InvalidationResponse {
    removed: usize,
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn cache_stats(State(state): State<AdminState>) -> Json<CacheStats> {
    Json(state.pages.stats())
}

async fn invalidate_cache(State(state): State<AdminState>) -> Response {
    state.pages.invalidate_all();
    StatusCode::NO_CONTENT.into_response()
}

async fn invalidate_prefix(
    State(state): State<AdminState>,
    Json(body): Json<InvalidatePrefixRequest>,
) -> Response {
    // An empty prefix matches every key; clearing everything has its own route.
    if body.prefix.is_empty() {
        return HttpError::new(
            "infra::http::admin::invalidate_prefix",
            StatusCode::BAD_REQUEST,
            "Prefix must not be empty",
            "empty prefix rejected; use /cache/invalidate to clear the cache",
        )
        .into_response();
    }

    let removed = state.pages.invalidate_prefix(&body.prefix);
    Json(InvalidationResponse { removed }).into_response()
}

async fn invalidate_section(
    State(state): State<AdminState>,
    Path(section): Path<String>,
) -> Response {
    match section.parse::<Section>() {
        Ok(section) => {
            let removed = state.pages.invalidate_section(section);
            Json(InvalidationResponse { removed }).into_response()
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn invalidate_key(State(state): State<AdminState>, Path(key): Path<String>) -> Response {
    if state.pages.invalidate_key(&key) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        HttpError::new(
            "infra::http::admin::invalidate_key",
            StatusCode::NOT_FOUND,
            "Key not cached",
            format!("no cache entry for `{key}`"),
        )
        .into_response()
    }
}
