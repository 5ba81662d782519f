//! Page cache — bounded, time-expiring store for fetched listing pages.
//!
//! ## Eviction
//!
//! Entries expire after a fixed TTL and are removed on the next read, or by
//! the periodic sweeper. When the store is full, the oldest-*inserted*
//! surviving entry is evicted to admit a new one — plain insertion order,
//! not LRU; reading an entry does not protect it.
//!
//! The cache is constructed explicitly and shared via `Arc` rather than
//! living as a hidden module-level global, so tests can build fresh
//! instances while the application still runs a single shared store.

use crate::fetch::SourceSelector;
use crate::model::Property;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Default entry lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);
/// Default maximum number of cached pages.
pub const DEFAULT_CAPACITY: usize = 100;

/// Composite key for one cached page.
pub fn cache_key(selector: SourceSelector, page: u32, page_size: u32) -> String {
    format!("{selector}:{page}:{page_size}")
}

struct CacheEntry {
    data: Vec<Property>,
    cached_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() >= ttl
    }
}

struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    /// Insertion order, oldest first.
    order: VecDeque<String>,
}

/// Bounded TTL cache for listing pages.
pub struct PropertyCache {
    inner: Mutex<CacheInner>,
    ttl: Duration,
    capacity: usize,
}

impl PropertyCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Cache with the standard 5-minute TTL and 100-entry bound.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_CAPACITY)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh data for the key, or a miss. An expired entry is removed and
    /// reported as a miss.
    pub fn get(&self, key: &str) -> Option<Vec<Property>> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.entries.get(key).is_some_and(|e| e.is_expired(self.ttl)) {
            inner.entries.remove(key);
            inner.order.retain(|k| k != key);
            return None;
        }
        inner.entries.get(key).map(|e| e.data.clone())
    }

    /// Store a page, replacing any existing entry wholesale. At capacity the
    /// oldest-inserted entry is evicted first.
    pub fn set(&self, key: &str, data: Vec<Property>) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.entries.contains_key(key) {
            // Replacement counts as a fresh insertion.
            inner.order.retain(|k| k != key);
        } else if inner.entries.len() >= self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                tracing::debug!(key = %oldest, "cache full, evicting oldest page");
                inner.entries.remove(&oldest);
            }
        }
        inner.order.push_back(key.to_string());
        inner.entries.insert(
            key.to_string(),
            CacheEntry {
                data,
                cached_at: Instant::now(),
            },
        );
    }

    /// Drop a single entry.
    pub fn invalidate(&self, key: &str) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.entries.remove(key).is_some() {
            inner.order.retain(|k| k != key);
        }
    }

    /// Remove every expired entry.
    pub fn purge_expired(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let ttl = self.ttl;
        inner.entries.retain(|_, e| !e.is_expired(ttl));
        let live: Vec<String> = inner.entries.keys().cloned().collect();
        inner.order.retain(|k| live.contains(k));
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spawn the periodic sweep, one pass per TTL interval. The task ends on
    /// its own once the cache is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let cache = Arc::downgrade(self);
        let period = self.ttl;
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(period);
            tick.tick().await; // first tick completes immediately
            loop {
                tick.tick().await;
                match cache.upgrade() {
                    Some(cache) => cache.purge_expired(),
                    None => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::normalize::normalize;
    use serde_json::json;

    fn page(ids: &[&str]) -> Vec<Property> {
        ids.iter()
            .map(|id| normalize(&json!({ "id": id })))
            .collect()
    }

    #[test]
    fn roundtrip() {
        let cache = PropertyCache::with_defaults();
        let data = page(&["a", "b"]);
        cache.set("all:1:12", data.clone());
        assert_eq!(cache.get("all:1:12"), Some(data));
    }

    #[test]
    fn miss_on_unknown_key() {
        let cache = PropertyCache::with_defaults();
        assert_eq!(cache.get("all:1:12"), None);
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let cache = PropertyCache::new(Duration::from_secs(0), 10);
        cache.set("k", page(&["a"]));
        assert_eq!(cache.get("k"), None);
        // The expired entry was removed, not just hidden.
        assert!(cache.is_empty());
    }

    #[test]
    fn capacity_evicts_oldest_inserted() {
        let cache = PropertyCache::new(DEFAULT_TTL, 3);
        cache.set("k1", page(&["a"]));
        cache.set("k2", page(&["b"]));
        cache.set("k3", page(&["c"]));

        // Reading k1 does not protect it — eviction is insertion-ordered.
        let _ = cache.get("k1");

        cache.set("k4", page(&["d"]));
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get("k1"), None);
        assert!(cache.get("k2").is_some());
        assert!(cache.get("k3").is_some());
        assert!(cache.get("k4").is_some());
    }

    #[test]
    fn replacement_does_not_grow_the_store() {
        let cache = PropertyCache::new(DEFAULT_TTL, 2);
        cache.set("k1", page(&["a"]));
        cache.set("k1", page(&["b"]));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("k1"), Some(page(&["b"])));
    }

    #[test]
    fn purge_expired_removes_all_stale_entries() {
        let cache = PropertyCache::new(Duration::from_secs(0), 10);
        cache.set("k1", page(&["a"]));
        cache.set("k2", page(&["b"]));
        cache.purge_expired();
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidate_removes_entry() {
        let cache = PropertyCache::with_defaults();
        cache.set("k1", page(&["a"]));
        cache.invalidate("k1");
        assert_eq!(cache.get("k1"), None);
    }

    #[tokio::test]
    async fn sweeper_stops_after_cache_is_dropped() {
        let cache = Arc::new(PropertyCache::new(Duration::from_millis(10), 10));
        let handle = cache.spawn_sweeper();
        drop(cache);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(handle.is_finished());
    }
}
