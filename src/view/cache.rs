//! Keyed cache for compiled templates.
//!
//! # Design Decisions
//! - Entries expire after a fixed TTL in development so edits show up
//!   without a restart; production keeps entries forever
//! - Lookups never hold a map guard across an await point
//! - Two concurrent misses for one key may both compute; the later
//!   insert wins and both results are equivalent

use std::future::Future;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::RunMode;
use crate::observability::metrics;

/// TTL applied to compiled templates in development mode.
pub const DEVELOPMENT_TTL: Duration = Duration::from_millis(100);

struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

pub struct TemplateCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    ttl: Option<Duration>,
}

impl<V: Clone> TemplateCache<V> {
    /// `ttl` of `None` keeps entries until invalidated.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn for_mode(mode: RunMode) -> Self {
        match mode {
            RunMode::Development => Self::new(Some(DEVELOPMENT_TTL)),
            RunMode::Production => Self::new(None),
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    fn is_fresh(&self, entry: &CacheEntry<V>) -> bool {
        self.ttl
            .map(|ttl| entry.stored_at.elapsed() < ttl)
            .unwrap_or(true)
    }

    /// Fresh value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<V> {
        let value = self
            .entries
            .get(key)
            .filter(|entry| self.is_fresh(entry))
            .map(|entry| entry.value.clone());
        metrics::record_cache_lookup(value.is_some());
        value
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Returns the fresh cached value or computes, stores and returns a new one.
    /// Failures are not cached.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: &str, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = compute().await?;
        self.insert(key, value.clone());
        Ok(value)
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_unbounded_cache_computes_once() {
        let cache: TemplateCache<usize> = TemplateCache::new(None);
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = cache
                .get_or_try_insert_with("view", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>(7)
                })
                .await
                .unwrap();
            assert_eq!(value, 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_entries_expire_after_ttl() {
        let cache: TemplateCache<&'static str> = TemplateCache::new(Some(Duration::from_millis(20)));
        cache.insert("view", "old");
        assert_eq!(cache.get("view"), Some("old"));

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get("view"), None);

        let value = cache
            .get_or_try_insert_with("view", || async { Ok::<_, ()>("new") })
            .await
            .unwrap();
        assert_eq!(value, "new");
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let cache: TemplateCache<u8> = TemplateCache::new(None);
        let failed = cache
            .get_or_try_insert_with("view", || async { Err::<u8, _>("boom") })
            .await;
        assert!(failed.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_mode_ttls() {
        assert_eq!(TemplateCache::<u8>::for_mode(RunMode::Development).ttl(), Some(DEVELOPMENT_TTL));
        assert_eq!(TemplateCache::<u8>::for_mode(RunMode::Production).ttl(), None);
    }
}
