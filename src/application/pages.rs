//! Cache-aside page delivery.
//!
//! Public handlers ask [`PageService`] for a page. A live cache entry is
//! returned as-is; otherwise the page is rendered by the [`PageSource`]
//! (content queries plus templates) and stored only when rendering succeeded.

use std::{sync::Arc, time::Instant};

use async_trait::async_trait;
use metrics::histogram;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    cache::{CacheConfig, CacheStats, PageCache, page_key, preview_key, section_prefix},
    domain::{pages::PageRequest, sections::Section},
};

const METRIC_RENDER_MS: &str = "sitecache_render_ms";

/// Produces the HTML for a page from the underlying content.
///
/// `Ok(None)` means the page does not exist; it is never cached.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn render(&self, request: &PageRequest) -> Result<Option<String>, PageSourceError>;
}

#[derive(Debug, Error)]
pub enum PageSourceError {
    #[error("failed to read page content: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to render page: {message}")]
    Render { message: String },
}

impl PageSourceError {
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
#[error("failed to render `{key}`")]
pub struct PageError {
    key: String,
    #[source]
    source: PageSourceError,
}

impl PageError {
    pub fn key(&self) -> &str {
        &self.key
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Served from the cache.
    Hit(String),
    /// Rendered for this request (and stored when caching is enabled).
    Rendered(String),
    NotFound,
}

pub struct PageService {
    cache: Arc<PageCache>,
    source: Arc<dyn PageSource>,
    config: CacheConfig,
}

impl PageService {
    pub fn new(cache: Arc<PageCache>, source: Arc<dyn PageSource>, config: CacheConfig) -> Self {
        Self {
            cache,
            source,
            config,
        }
    }

    pub fn cache(&self) -> &Arc<PageCache> {
        &self.cache
    }

    pub async fn page(&self, request: &PageRequest) -> Result<PageOutcome, PageError> {
        let key = page_key(request);

        if !self.config.enabled {
            return Ok(match self.render(request, &key, "uncached").await? {
                Some(html) => PageOutcome::Rendered(html),
                None => PageOutcome::NotFound,
            });
        }

        if let Some(html) = self.cache.get(&key) {
            debug!(cache = "page", outcome = "hit", key = %key, "serving cached page");
            return Ok(PageOutcome::Hit(html));
        }

        debug!(cache = "page", outcome = "miss", key = %key, "cache miss, rendering page");

        match self.render(request, &key, "page").await? {
            Some(html) => {
                let ttl = self.config.ttl_for(request.section());
                self.cache.set(key, html.clone(), ttl);
                Ok(PageOutcome::Rendered(html))
            }
            None => Ok(PageOutcome::NotFound),
        }
    }

    /// Render without reading or writing the cache.
    pub async fn preview(&self, request: &PageRequest) -> Result<Option<String>, PageError> {
        let key = preview_key(request);
        self.render(request, &key, "preview").await
    }

    /// Drop every cached page of `section`. Called after content in the
    /// section is created, updated, or deleted.
    pub fn invalidate_section(&self, section: Section) -> usize {
        let prefix = section_prefix(section);
        let removed = self.cache.delete_by_prefix(&prefix);
        info!(
            target = "sitecache::cache::invalidate",
            section = %section,
            removed,
            "invalidated section pages"
        );
        removed
    }

    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let removed = self.cache.delete_by_prefix(prefix);
        info!(
            target = "sitecache::cache::invalidate",
            prefix,
            removed,
            "invalidated pages by prefix"
        );
        removed
    }

    pub fn invalidate_key(&self, key: &str) -> bool {
        let removed = self.cache.delete(key);
        info!(
            target = "sitecache::cache::invalidate",
            key,
            removed,
            "invalidated page key"
        );
        removed
    }

    pub fn invalidate_all(&self) -> usize {
        let removed = self.cache.clear();
        info!(
            target = "sitecache::cache::invalidate",
            removed,
            "invalidated all pages"
        );
        removed
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    async fn render(
        &self,
        request: &PageRequest,
        key: &str,
        mode: &'static str,
    ) -> Result<Option<String>, PageError> {
        let started_at = Instant::now();
        let result = self.source.render(request).await;
        histogram!(METRIC_RENDER_MS, "mode" => mode)
            .record(started_at.elapsed().as_secs_f64() * 1000.0);

        result.map_err(|source| {
            warn!(key, mode, error = %source, "page render failed; cache left untouched");
            PageError {
                key: key.to_string(),
                source,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use super::*;

    /// Serves canned pages keyed by cache key and counts renders.
    #[derive(Default)]
    struct StubSource {
        pages: Mutex<HashMap<String, String>>,
        fail: Mutex<bool>,
        renders: AtomicUsize,
    }

    impl StubSource {
        fn with_page(self, request: &PageRequest, html: &str) -> Self {
            self.put(request, html);
            self
        }

        fn put(&self, request: &PageRequest, html: &str) {
            self.pages
                .lock()
                .unwrap()
                .insert(page_key(request), html.to_string());
        }

        fn set_failing(&self, fail: bool) {
            *self.fail.lock().unwrap() = fail;
        }

        fn renders(&self) -> usize {
            self.renders.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageSource for StubSource {
        async fn render(
            &self,
            request: &PageRequest,
        ) -> Result<Option<String>, PageSourceError> {
            self.renders.fetch_add(1, Ordering::SeqCst);
            if *self.fail.lock().unwrap() {
                return Err(PageSourceError::render("template exploded"));
            }
            Ok(self.pages.lock().unwrap().get(&page_key(request)).cloned())
        }
    }

    fn products() -> PageRequest {
        PageRequest::index(Section::Products, None, None).unwrap()
    }

    fn service(source: Arc<StubSource>, config: CacheConfig) -> PageService {
        PageService::new(Arc::new(PageCache::new()), source, config)
    }

    #[tokio::test]
    async fn second_request_is_served_from_cache() {
        let source = Arc::new(StubSource::default().with_page(&products(), "A"));
        let service = service(Arc::clone(&source), CacheConfig::default());

        assert_eq!(
            service.page(&products()).await.unwrap(),
            PageOutcome::Rendered("A".to_string())
        );
        assert_eq!(
            service.page(&products()).await.unwrap(),
            PageOutcome::Hit("A".to_string())
        );
        assert_eq!(source.renders(), 1);
    }

    #[tokio::test]
    async fn invalidation_forces_rerender() {
        let source = Arc::new(StubSource::default().with_page(&products(), "A"));
        let service = service(Arc::clone(&source), CacheConfig::default());

        service.page(&products()).await.unwrap();
        source.put(&products(), "B");

        assert_eq!(service.invalidate_section(Section::Products), 1);
        assert_eq!(
            service.page(&products()).await.unwrap(),
            PageOutcome::Rendered("B".to_string())
        );
        assert_eq!(
            service.page(&products()).await.unwrap(),
            PageOutcome::Hit("B".to_string())
        );
    }

    #[tokio::test]
    async fn failed_render_is_not_cached() {
        let source = Arc::new(StubSource::default().with_page(&products(), "A"));
        let service = service(Arc::clone(&source), CacheConfig::default());

        source.set_failing(true);
        let err = service.page(&products()).await.unwrap_err();
        assert_eq!(err.key(), "page:products");
        assert!(service.cache().is_empty());
        assert_eq!(
            crate::application::error::HttpError::from(err).status(),
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );

        source.set_failing(false);
        assert_eq!(
            service.page(&products()).await.unwrap(),
            PageOutcome::Rendered("A".to_string())
        );
    }

    #[tokio::test]
    async fn missing_pages_are_not_cached() {
        let source = Arc::new(StubSource::default());
        let service = service(Arc::clone(&source), CacheConfig::default());
        let request = PageRequest::detail(Section::Blog, "nope").unwrap();

        assert_eq!(
            service.page(&request).await.unwrap(),
            PageOutcome::NotFound
        );
        assert_eq!(
            service.page(&request).await.unwrap(),
            PageOutcome::NotFound
        );
        assert_eq!(source.renders(), 2);
        assert!(service.cache().is_empty());
    }

    #[tokio::test]
    async fn preview_never_touches_cache() {
        let request = PageRequest::detail(Section::Blog, "draft").unwrap();
        let source = Arc::new(StubSource::default().with_page(&request, "draft v1"));
        let service = service(Arc::clone(&source), CacheConfig::default());

        assert_eq!(
            service.preview(&request).await.unwrap(),
            Some("draft v1".to_string())
        );
        assert!(service.cache().is_empty());

        source.put(&request, "draft v2");
        assert_eq!(
            service.preview(&request).await.unwrap(),
            Some("draft v2".to_string())
        );
    }

    #[tokio::test]
    async fn preview_ignores_cached_public_render() {
        let request = PageRequest::detail(Section::Blog, "post").unwrap();
        let source = Arc::new(StubSource::default().with_page(&request, "published"));
        let service = service(Arc::clone(&source), CacheConfig::default());

        service.page(&request).await.unwrap();
        source.put(&request, "edited");

        assert_eq!(
            service.preview(&request).await.unwrap(),
            Some("edited".to_string())
        );
        assert_eq!(
            service.page(&request).await.unwrap(),
            PageOutcome::Hit("published".to_string())
        );
    }

    #[tokio::test]
    async fn disabled_cache_always_renders() {
        let source = Arc::new(StubSource::default().with_page(&products(), "A"));
        let config = CacheConfig {
            enabled: false,
            ..Default::default()
        };
        let service = service(Arc::clone(&source), config);

        for _ in 0..3 {
            assert_eq!(
                service.page(&products()).await.unwrap(),
                PageOutcome::Rendered("A".to_string())
            );
        }
        assert_eq!(source.renders(), 3);
        assert!(service.cache().is_empty());
    }

    #[tokio::test]
    async fn section_invalidation_spares_other_sections() {
        let blog = PageRequest::detail(Section::Blog, "hello").unwrap();
        let source = Arc::new(
            StubSource::default()
                .with_page(&products(), "P")
                .with_page(&blog, "B"),
        );
        let service = service(Arc::clone(&source), CacheConfig::default());

        service.page(&products()).await.unwrap();
        service.page(&blog).await.unwrap();

        assert_eq!(service.invalidate_section(Section::Blog), 1);
        assert_eq!(
            service.page(&products()).await.unwrap(),
            PageOutcome::Hit("P".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn section_ttl_is_applied_on_store() {
        let source = Arc::new(StubSource::default().with_page(&products(), "A"));
        let mut config = CacheConfig::default();
        config.section_ttl_seconds.insert(Section::Products, 5);
        let service = service(Arc::clone(&source), config);

        service.page(&products()).await.unwrap();
        tokio::time::advance(std::time::Duration::from_secs(6)).await;

        assert_eq!(
            service.page(&products()).await.unwrap(),
            PageOutcome::Rendered("A".to_string())
        );
        assert_eq!(source.renders(), 2);
    }
}
