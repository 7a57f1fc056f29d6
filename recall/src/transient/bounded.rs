use shared::Capacity;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

struct Entry<V> {
    value: V,
    stamp: u64,
}

/// Recency-ordered map with LRU eviction
///
/// Every hit and every write stamps the entry with a monotonic clock; the
/// recency index orders entries by stamp so the least-recently-used entry is
/// always the first one. Eviction happens inside `set`, atomically with the
/// insertion that triggered it. Shrinking the capacity is lazy: an oversized
/// cache keeps its entries until the next write.
pub struct BoundedCache<K, V> {
    entries: HashMap<K, Entry<V>>,
    recency: BTreeMap<u64, K>,
    clock: u64,
    capacity: Capacity,
}

impl<K, V> BoundedCache<K, V> {
    pub fn new(capacity: Capacity) -> Self {
        Self {
            entries: HashMap::new(),
            recency: BTreeMap::new(),
            clock: 0,
            capacity,
        }
    }

    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    /// Change the entry limit. Takes effect on the next write; entries
    /// already over the new limit are not evicted until then.
    pub fn set_capacity(&mut self, capacity: Capacity) {
        self.capacity = capacity;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove all entries immediately.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

impl<K, V> BoundedCache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    /// Look up `key`, marking it most-recently-used on a hit.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let stamp = self.tick();
        let entry = self.entries.get_mut(key)?;
        self.recency.remove(&entry.stamp);
        entry.stamp = stamp;
        self.recency.insert(stamp, key.clone());
        Some(entry.value.clone())
    }

    /// Check for `key` without disturbing recency order.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or overwrite `key`, marking it most-recently-used, then evict
    /// least-recently-used entries until the cache fits its capacity.
    pub fn set(&mut self, key: K, value: V) {
        let stamp = self.tick();
        if let Some(previous) = self.entries.insert(key.clone(), Entry { value, stamp }) {
            self.recency.remove(&previous.stamp);
        }
        self.recency.insert(stamp, key);

        if let Some(limit) = self.capacity.limit() {
            while self.entries.len() > limit {
                match self.recency.pop_first() {
                    Some((_, oldest)) => {
                        self.entries.remove(&oldest);
                    }
                    None => break,
                }
            }
        }
    }
}
