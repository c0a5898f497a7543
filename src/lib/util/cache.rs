//! Module implementing the LRU cache shared between rendering threads.

use std::borrow::Borrow;
use std::hash::Hash;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use antidote::Mutex;
use lru_cache::LruCache;


/// LRU cache of `Arc`'d values which can be shared between threads.
/// Every lookup is counted as either a hit or a miss.
pub struct ThreadSafeCache<K: Eq + Hash, V> {
    entries: Mutex<LruCache<K, Arc<V>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<K: Eq + Hash, V> ThreadSafeCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        ThreadSafeCache{
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<Arc<V>>
        where K: Borrow<Q>, Q: ?Sized + Eq + Hash
    {
        let found = self.entries.lock().get_mut(key).map(|v| v.clone());
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Cache the value under given key, unless some value is there already.
    /// Returns whichever value ends up cached.
    pub fn put(&self, key: K, value: V) -> Arc<V> {
        let mut entries = self.entries.lock();
        if let Some(existing) = entries.get_mut(&key) {
            return existing.clone();
        }
        let value = Arc::new(value);
        entries.insert(key, value.clone());
        value
    }
}

impl<K: Eq + Hash, V> ThreadSafeCache<K, V> {
    #[inline]
    pub fn capacity(&self) -> usize {
        self.entries.lock().capacity()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }
}

impl<K: Eq + Hash, V> fmt::Debug for ThreadSafeCache<K, V> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("ThreadSafeCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("hits", &self.hits())
            .field("misses", &self.misses())
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use spectral::prelude::*;
    use super::ThreadSafeCache;

    #[test]
    fn hits_and_misses() {
        let cache = ThreadSafeCache::<String, u32>::new(2);
        assert_that!(cache.get("a")).is_none();
        cache.put("a".into(), 1);
        assert_that!(cache.get("a").map(|v| *v)).is_equal_to(Some(1));
        assert_eq!(1, cache.hits());
        assert_eq!(1, cache.misses());
    }

    #[test]
    fn put_keeps_first_value() {
        let cache = ThreadSafeCache::<&'static str, u32>::new(2);
        assert_eq!(1, *cache.put("a", 1));
        assert_eq!(1, *cache.put("a", 2));
        assert_eq!(1, cache.len());
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = ThreadSafeCache::<&'static str, u32>::new(2);
        cache.put("a", 1);
        cache.put("b", 2);
        cache.get("a");
        cache.put("c", 3);
        assert_eq!(2, cache.len());
        assert_that!(cache.get("b")).is_none();
        assert_that!(cache.get("a")).is_some();
    }
}
