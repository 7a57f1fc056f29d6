use crate::key::TransientKey;
use crate::transient::BoundedCache;
use dashmap::DashMap;
use shared::Capacity;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};

/// Owner of the named in-memory caches
///
/// Each name maps to an independent [`BoundedCache`] created lazily on first
/// use with the manager's default capacity. The manager is shared by cloning
/// an `Arc` around it; each named cache serializes its readers and writers
/// with its own mutex.
pub struct CacheManager<V> {
    caches: DashMap<String, Arc<Mutex<BoundedCache<TransientKey, V>>>>,
    default_capacity: Capacity,
}

impl<V> CacheManager<V> {
    pub fn new() -> Self {
        Self::with_default_capacity(Capacity::default())
    }

    pub fn with_default_capacity(default_capacity: Capacity) -> Self {
        Self {
            caches: DashMap::new(),
            default_capacity,
        }
    }

    /// Fetch the cache registered under `name`, creating it if required.
    pub fn get(&self, name: &str) -> Arc<Mutex<BoundedCache<TransientKey, V>>> {
        self.caches
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(BoundedCache::new(self.default_capacity))))
            .value()
            .clone()
    }

    /// Change the capacity of the cache registered under `name`, creating it
    /// if required. Enforcement is lazy, on the cache's next write.
    pub fn set_limit(&self, name: &str, capacity: Capacity) {
        let cache = self.get(name);
        lock(&cache).set_capacity(capacity);
    }

    /// Empty the cache registered under `name`, if it exists.
    pub fn clear(&self, name: &str) {
        if let Some(cache) = self.caches.get(name) {
            lock(cache.value()).clear();
        }
    }

    /// Empty every named cache.
    pub fn clear_all(&self) {
        for entry in self.caches.iter() {
            lock(entry.value()).clear();
        }
    }
}

impl<V> Default for CacheManager<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Debug for CacheManager<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("caches", &self.caches.len())
            .field("default_capacity", &self.default_capacity)
            .finish()
    }
}

pub(crate) fn lock<K, V>(
    cache: &Mutex<BoundedCache<K, V>>,
) -> std::sync::MutexGuard<'_, BoundedCache<K, V>> {
    cache.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
