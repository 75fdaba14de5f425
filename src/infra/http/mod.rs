mod admin;
mod middleware;
mod public;

pub use admin::{AdminState, build_admin_router};
pub use public::{HttpState, build_router};

use axum::http::HeaderName;

/// Response header reporting whether a page came from the cache (`hit`) or
/// was rendered for the request (`miss`).
pub const CACHE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-cache");

/// Correlates a response with its log lines. Reused from the request when the
/// caller (a proxy, usually) already assigned one.
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Page a successful response carried, stashed in the response extensions
/// for the logging middleware.
#[derive(Debug, Clone)]
struct ServedPage {
    key: String,
    /// `hit`, `miss`, or `bypass` for previews.
    cache: &'static str,
}
