use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode, header::CACHE_CONTROL},
    middleware,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;

use crate::{
    application::{
        error::HttpError,
        pages::{PageOutcome, PageService},
    },
    cache::{page_key, preview_key},
    domain::{error::DomainError, pages::PageRequest, sections::Section},
};

use super::{
    CACHE_STATUS_HEADER, ServedPage,
    middleware::{log_responses, set_request_context},
};

#[derive(Clone)]
pub struct HttpState {
    pub pages: Arc<PageService>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/_health", get(health))
        .route("/preview/{section}/{slug}", get(preview))
        .route("/{section}", get(section_index))
        .route("/{section}/{slug}", get(detail))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IndexQuery {
    page: Option<u32>,
    category: Option<String>,
}

async fn home(State(state): State<HttpState>) -> Response {
    page_response(&state, &PageRequest::Home).await
}

async fn section_index(
    State(state): State<HttpState>,
    Path(section): Path<String>,
    Query(query): Query<IndexQuery>,
) -> Response {
    let request = section.parse::<Section>().and_then(|section| {
        PageRequest::index(section, query.page, query.category.as_deref())
    });
    match request {
        Ok(request) => page_response(&state, &request).await,
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn detail(
    State(state): State<HttpState>,
    Path((section, slug)): Path<(String, String)>,
) -> Response {
    match detail_request(&section, &slug) {
        Ok(request) => page_response(&state, &request).await,
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn preview(
    State(state): State<HttpState>,
    Path((section, slug)): Path<(String, String)>,
) -> Response {
    let request = match detail_request(&section, &slug) {
        Ok(request) => request,
        Err(err) => return HttpError::from(err).into_response(),
    };

    let mut response = match state.pages.preview(&request).await {
        Ok(Some(html)) => {
            let mut response = (StatusCode::OK, Html(html)).into_response();
            response.extensions_mut().insert(ServedPage {
                key: preview_key(&request),
                cache: "bypass",
            });
            response
        }
        Ok(None) => not_found(preview_key(&request)),
        Err(err) => HttpError::from(err).into_response(),
    };
    set_no_store(&mut response);
    response
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

fn detail_request(section: &str, slug: &str) -> Result<PageRequest, DomainError> {
    let section = section.parse::<Section>()?;
    PageRequest::detail(section, slug)
}

async fn page_response(state: &HttpState, request: &PageRequest) -> Response {
    match state.pages.page(request).await {
        Ok(PageOutcome::Hit(html)) => html_response(html, page_key(request), "hit"),
        Ok(PageOutcome::Rendered(html)) => html_response(html, page_key(request), "miss"),
        Ok(PageOutcome::NotFound) => not_found(page_key(request)),
        Err(err) => HttpError::from(err).into_response(),
    }
}

fn html_response(html: String, key: String, cache: &'static str) -> Response {
    let mut response =
        (StatusCode::OK, [(CACHE_STATUS_HEADER, cache)], Html(html)).into_response();
    response.extensions_mut().insert(ServedPage { key, cache });
    response
}

fn not_found(key: String) -> Response {
    HttpError::new(
        "infra::http::public::not_found",
        StatusCode::NOT_FOUND,
        "Page not found",
        "no content at this address",
    )
    .for_page(key)
    .into_response()
}

fn set_no_store(response: &mut Response) {
    let value = HeaderValue::from_static("no-store");
    response.headers_mut().insert(CACHE_CONTROL, value);
}
