//! In-process page cache.
//!
//! Maps string keys to rendered values with an optional absolute deadline.
//! Every operation holds the same exclusive lock for its whole duration,
//! including the prefix scan, and never awaits or touches I/O while holding it.

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use metrics::{counter, gauge};
use serde::Serialize;
use tokio::time::Instant;
use tracing::debug;

use super::lock::mutex_lock;

const SOURCE: &str = "cache::store";

const METRIC_HIT_TOTAL: &str = "sitecache_page_hit_total";
const METRIC_MISS_TOTAL: &str = "sitecache_page_miss_total";
const METRIC_EXPIRED_TOTAL: &str = "sitecache_page_expired_total";
const METRIC_INVALIDATED_TOTAL: &str = "sitecache_page_invalidated_total";
const METRIC_ENTRIES: &str = "sitecache_entries";

/// A cached value and the instant after which it is stale.
///
/// `expires_at == None` never expires; only explicit deletion removes it.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl_seconds: i64, now: Instant) -> Self {
        let expires_at = u64::try_from(ttl_seconds)
            .ok()
            .filter(|secs| *secs > 0)
            .and_then(|secs| now.checked_add(Duration::from_secs(secs)));
        Self { value, expires_at }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now > deadline)
    }
}

enum Lookup<V> {
    Live(V),
    Expired,
    Absent,
}

/// Point-in-time view of the cache for the admin surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Entries currently held, including stale ones not yet evicted.
    pub entries: usize,
    /// Entries whose deadline has passed but which no read or sweep has evicted.
    pub expired_pending: usize,
    pub hits: u64,
    pub misses: u64,
    /// Entries evicted because their deadline had passed.
    pub expirations: u64,
    /// Entries removed by explicit deletion or invalidation.
    pub invalidations: u64,
}

/// Process-wide page cache, shared behind an `Arc`.
pub struct PageCache<V = String> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    expirations: AtomicU64,
    invalidations: AtomicU64,
}

impl<V> Default for PageCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> PageCache<V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
        }
    }

    /// Look up `key`. Absent and expired entries are misses; an expired entry
    /// is evicted on the way out.
    pub fn get(&self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        let now = Instant::now();
        let mut entries = mutex_lock(&self.entries, SOURCE, "get");

        let lookup = match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => Lookup::Live(entry.value.clone()),
            Some(_) => Lookup::Expired,
            None => Lookup::Absent,
        };

        match lookup {
            Lookup::Live(value) => {
                drop(entries);
                self.hits.fetch_add(1, Ordering::Relaxed);
                counter!(METRIC_HIT_TOTAL).increment(1);
                return Some(value);
            }
            Lookup::Expired => {
                entries.remove(key);
                record_entries(&entries);
                drop(entries);
                self.expirations.fetch_add(1, Ordering::Relaxed);
                counter!(METRIC_EXPIRED_TOTAL).increment(1);
            }
            Lookup::Absent => drop(entries),
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        counter!(METRIC_MISS_TOTAL).increment(1);
        None
    }

    /// Store `value` under `key`, replacing any previous entry regardless of
    /// its deadline. `ttl_seconds <= 0` stores an entry that never expires.
    pub fn set(&self, key: impl Into<String>, value: V, ttl_seconds: i64) {
        let entry = CacheEntry::new(value, ttl_seconds, Instant::now());
        let mut entries = mutex_lock(&self.entries, SOURCE, "set");
        entries.insert(key.into(), entry);
        record_entries(&entries);
    }

    /// Remove exactly `key`. Returns whether an entry was present.
    pub fn delete(&self, key: &str) -> bool {
        let mut entries = mutex_lock(&self.entries, SOURCE, "delete");
        let removed = entries.remove(key).is_some();
        if removed {
            record_entries(&entries);
        }
        drop(entries);

        if removed {
            self.record_invalidations(1);
        }
        removed
    }

    /// Remove every entry whose key starts with `prefix`, including an exact
    /// match. Plain string prefix: `page:blog` also removes `page:blogging`.
    ///
    /// Scans every key under the lock, so the cost is linear in the number of
    /// entries. The key space is bounded by the number of distinct pages.
    pub fn delete_by_prefix(&self, prefix: &str) -> usize {
        let mut entries = mutex_lock(&self.entries, SOURCE, "delete_by_prefix");
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - entries.len();
        if removed > 0 {
            record_entries(&entries);
        }
        drop(entries);

        debug!(cache = "page", prefix, removed, "invalidated cached pages by prefix");
        if removed > 0 {
            self.record_invalidations(removed);
        }
        removed
    }

    /// Drop every entry.
    pub fn clear(&self) -> usize {
        let mut entries = mutex_lock(&self.entries, SOURCE, "clear");
        let removed = entries.len();
        entries.clear();
        record_entries(&entries);
        drop(entries);

        debug!(cache = "page", removed, "cleared page cache");
        if removed > 0 {
            self.record_invalidations(removed);
        }
        removed
    }

    /// Evict every entry whose deadline has passed. Reads already treat such
    /// entries as misses; this only reclaims their memory.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = mutex_lock(&self.entries, SOURCE, "purge_expired");
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let purged = before - entries.len();
        if purged > 0 {
            record_entries(&entries);
        }
        drop(entries);

        if purged > 0 {
            self.expirations.fetch_add(purged as u64, Ordering::Relaxed);
            counter!(METRIC_EXPIRED_TOTAL).increment(purged as u64);
        }
        purged
    }

    /// Number of held entries, including stale ones not yet evicted.
    pub fn len(&self) -> usize {
        mutex_lock(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = mutex_lock(&self.entries, SOURCE, "stats");
        let total = entries.len();
        let expired_pending = entries
            .values()
            .filter(|entry| entry.is_expired(now))
            .count();
        drop(entries);

        CacheStats {
            entries: total,
            expired_pending,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }

    fn record_invalidations(&self, removed: usize) {
        self.invalidations.fetch_add(removed as u64, Ordering::Relaxed);
        counter!(METRIC_INVALIDATED_TOTAL).increment(removed as u64);
    }
}

/// Publish the entry count. Called with the guard held so concurrent
/// mutations publish in the same order they applied.
fn record_entries<V>(entries: &HashMap<String, CacheEntry<V>>) {
    gauge!(METRIC_ENTRIES).set(entries.len() as f64);
}
