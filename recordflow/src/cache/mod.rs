//! Memoisation with an optional time-to-live.
//!
//! [`TtlCache`] is the explicit replacement for a caching decorator: the owner
//! decides what is cached and for how long, and expired entries are evicted
//! lazily on access.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};
use tracing::debug;

/// Key → value store whose entries expire after `ttl` (never, when `None`).
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Option<Duration>,
    entries: HashMap<K, (V, Instant)>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    fn is_fresh(&self, stored_at: Instant) -> bool {
        self.ttl.map_or(true, |ttl| stored_at.elapsed() < ttl)
    }

    /// Cached value for `key`, evicting it first if it has expired.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let fresh = match self.entries.get(key) {
            Some((_, stored_at)) => self.is_fresh(*stored_at),
            None => return None,
        };

        if fresh {
            self.entries.get(key).map(|(value, _)| value.clone())
        } else {
            self.entries.remove(key);
            debug!("cache entry expired");
            None
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.entries.insert(key, (value, Instant::now()));
    }

    /// Return the cached value or compute, store and return a new one.
    /// Errors from `compute` are passed through and nothing is stored.
    pub fn get_or_try_insert_with<E, F>(&mut self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(&key) {
            debug!("cache hit");
            return Ok(value);
        }
        debug!("cache miss");
        let value = compute()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    pub fn clear(&mut self) {
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

    #[test]
    fn test_hit_and_miss() {
        let mut cache: TtlCache<String, u32> = TtlCache::new(None);
        let mut computed = 0;

        for _ in 0..3 {
            let value: Result<u32, ()> = cache.get_or_try_insert_with("k".to_string(), || {
                computed += 1;
                Ok(7)
            });
            assert_eq!(value, Ok(7));
        }
        assert_eq!(computed, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expired_entries_are_evicted() {
        let mut cache = TtlCache::new(Some(Duration::from_millis(5)));
        cache.insert("k", 1);
        std::thread::sleep(Duration::from_millis(20));

        assert_eq!(cache.get(&"k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_errors_are_not_cached() {
        let mut cache: TtlCache<&str, u32> = TtlCache::new(None);
        let first: Result<u32, &str> = cache.get_or_try_insert_with("k", || Err("boom"));
        assert!(first.is_err());
        assert!(cache.is_empty());

        cache.insert("k", 2);
        cache.clear();
        assert_eq!(cache.get(&"k"), None);
    }
}
