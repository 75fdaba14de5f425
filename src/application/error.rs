use std::{error::Error as StdError, iter};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    application::pages::PageError, config::LoadError, domain::error::DomainError,
    infra::error::InfraError,
};

/// Why a page request failed, kept in the response extensions until the
/// logging middleware consumes it. Never sent to the client.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    /// Outermost error first.
    pub chain: Vec<String>,
    pub page_key: Option<String>,
}

impl ErrorReport {
    fn from_error(source: &'static str, error: &dyn StdError) -> Self {
        let chain = iter::successors(Some(error), |&current| current.source())
            .map(ToString::to_string)
            .collect();
        Self {
            source,
            chain,
            page_key: None,
        }
    }

    pub fn detail(&self) -> &str {
        self.chain
            .first()
            .map(String::as_str)
            .unwrap_or("no diagnostic available")
    }
}

/// Error response for the public and admin routers: a fixed public message
/// plus an [`ErrorReport`] for the logs.
#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    public_message: &'static str,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            status,
            public_message,
            report: ErrorReport {
                source,
                chain: vec![detail.into()],
                page_key: None,
            },
        }
    }

    /// Tag the failure with the cache key of the page being served.
    pub fn for_page(mut self, key: impl Into<String>) -> Self {
        self.report.page_key = Some(key.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn public_message(&self) -> &'static str {
        self.public_message
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.public_message).into_response();
        response.extensions_mut().insert(self.report);
        response
    }
}

impl From<PageError> for HttpError {
    fn from(error: PageError) -> Self {
        let key = error.key().to_string();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            public_message: "Page could not be rendered",
            report: ErrorReport::from_error("application::pages::render", &error),
        }
        .for_page(key)
    }
}

impl From<DomainError> for HttpError {
    fn from(error: DomainError) -> Self {
        let (source, public_message) = match &error {
            DomainError::UnknownSection { .. } => ("domain::sections", "Section not found"),
            DomainError::Validation { .. } => ("domain::pages", "Page not found"),
        };
        Self {
            status: StatusCode::NOT_FOUND,
            public_message,
            report: ErrorReport::from_error(source, &error),
        }
    }
}

/// Fatal startup or serving failure; `main` logs it and exits non-zero.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
}
