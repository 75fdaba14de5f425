//! Filesystem page source.
//!
//! Serves pre-rendered HTML fragments from a content directory laid out by
//! section:
//!
//! ```text
//! index.html                                   home
//! <section>/index.html                         section index
//! <section>/page/<n>.html                      paginated index
//! <section>/category/<slug>/index.html         filtered index, first page
//! <section>/category/<slug>/page/<n>.html      filtered index
//! <section>/<slug>.html                        detail
//! ```

use std::{io::ErrorKind, path::PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::{
    application::pages::{PageSource, PageSourceError},
    domain::pages::PageRequest,
};

#[derive(Debug, Clone)]
pub struct FsPageSource {
    root: PathBuf,
}

impl FsPageSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

/// Content path of `request`, relative to the content root.
///
/// Segments come from validated slugs and section names, so the result never
/// escapes the root.
pub fn relative_path(request: &PageRequest) -> PathBuf {
    match request {
        PageRequest::Home => PathBuf::from("index.html"),
        PageRequest::Index {
            section,
            page,
            category,
        } => {
            let mut path = PathBuf::from(section.as_str());
            if let Some(category) = category {
                path.push("category");
                path.push(category);
            }
            if page.get() == 1 {
                path.push("index.html");
            } else {
                path.push("page");
                path.push(format!("{page}.html"));
            }
            path
        }
        PageRequest::Detail { section, slug } => {
            PathBuf::from(section.as_str()).join(format!("{slug}.html"))
        }
    }
}

#[async_trait]
impl PageSource for FsPageSource {
    async fn render(&self, request: &PageRequest) -> Result<Option<String>, PageSourceError> {
        let path = self.root.join(relative_path(request));
        match tokio::fs::read_to_string(&path).await {
            Ok(html) => Ok(Some(html)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "page content not found");
                Ok(None)
            }
            Err(err) => Err(PageSourceError::Io(err)),
        }
    }
}
