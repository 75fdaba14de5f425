//! Page cache for rendered public pages.
//!
//! A single [`PageCache`] is built at startup and shared by every handler.
//! Public handlers read before rendering and write after a successful render;
//! admin mutations invalidate by key prefix.
//!
//! ## Configuration
//!
//! Cache behavior is controlled via `sitecache.toml`:
//!
//! ```toml
//! [cache]
//! enabled = true
//! default_ttl_seconds = 600
//! sweep_interval_seconds = 60
//!
//! [cache.section_ttl_seconds]
//! blog = 300
//! whitepapers = 1800
//! ```

mod config;
pub mod keys;
mod lock;
mod store;
mod sweeper;

pub use config::CacheConfig;
pub use keys::{page_key, preview_key, section_prefix};
pub use store::{CacheStats, PageCache};
pub use sweeper::spawn_sweeper;
