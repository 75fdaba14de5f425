use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use metrics_util::debugging::DebuggingRecorder;
use sitecache::application::pages::{PageService, PageSource, PageSourceError};
use sitecache::cache::{CacheConfig, PageCache};
use sitecache::domain::pages::PageRequest;
use sitecache::domain::sections::Section;
use sitecache::infra::telemetry;

struct StaticSource;

#[async_trait]
impl PageSource for StaticSource {
    async fn render(&self, _request: &PageRequest) -> Result<Option<String>, PageSourceError> {
        Ok(Some("<main>static</main>".to_string()))
    }
}

#[tokio::test(start_paused = true)]
async fn cache_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");
    telemetry::describe_metrics();

    let cache = Arc::new(PageCache::new());
    let service = PageService::new(
        Arc::clone(&cache),
        Arc::new(StaticSource),
        CacheConfig::default(),
    );

    let blog = PageRequest::index(Section::Blog, None, None).expect("valid request");
    let post = PageRequest::detail(Section::Blog, "launch").expect("valid request");

    // miss + render, then hit
    service.page(&blog).await.expect("render");
    service.page(&blog).await.expect("hit");
    service.preview(&post).await.expect("preview");

    // expiry on read
    cache.set("page:about", "<main>about</main>".to_string(), 1);
    tokio::time::advance(std::time::Duration::from_secs(2)).await;
    assert!(cache.get("page:about").is_none());

    service.invalidate_section(Section::Blog);

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    for expected in [
        "sitecache_page_hit_total",
        "sitecache_page_miss_total",
        "sitecache_page_expired_total",
        "sitecache_page_invalidated_total",
        "sitecache_entries",
        "sitecache_render_ms",
    ] {
        assert!(names.contains(expected), "missing metric {expected}: {names:?}");
    }
}
