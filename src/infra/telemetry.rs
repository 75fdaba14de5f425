use std::sync::Once;

use metrics::{Unit, describe_counter, describe_gauge, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

/// Register descriptions for the page cache metrics with the installed recorder.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "sitecache_page_hit_total",
            Unit::Count,
            "Total number of page cache hits."
        );
        describe_counter!(
            "sitecache_page_miss_total",
            Unit::Count,
            "Total number of page cache misses, including expired entries."
        );
        describe_counter!(
            "sitecache_page_expired_total",
            Unit::Count,
            "Total number of page cache entries evicted after their TTL passed."
        );
        describe_counter!(
            "sitecache_page_invalidated_total",
            Unit::Count,
            "Total number of page cache entries removed by explicit invalidation."
        );
        describe_gauge!(
            "sitecache_entries",
            Unit::Count,
            "Current number of entries held by the page cache."
        );
        describe_histogram!(
            "sitecache_render_ms",
            Unit::Milliseconds,
            "Page render latency on cache misses and previews in milliseconds."
        );
    });
}
