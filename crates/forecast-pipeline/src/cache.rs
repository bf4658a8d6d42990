//! LRU cache of opened datasets, keyed by run.

use std::num::NonZeroUsize;
use std::sync::Arc;

use gfs_common::{GriddedDataset, RunId};
use lru::LruCache;

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 - 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Bounded cache of open dataset handles.
///
/// Entries are never invalidated by age; the least recently used run is
/// evicted when capacity is exceeded.
pub struct DatasetCache {
    cache: LruCache<RunId, Arc<dyn GriddedDataset>>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl DatasetCache {
    /// Create a cache holding at most `capacity` runs (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// Look up a run, marking it most recently used on a hit.
    pub fn get(&mut self, run: &RunId) -> Option<Arc<dyn GriddedDataset>> {
        match self.cache.get(run) {
            Some(ds) => {
                self.hits += 1;
                Some(ds.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Check if a run is cached without updating LRU order.
    pub fn contains(&self, run: &RunId) -> bool {
        self.cache.contains(run)
    }

    /// Insert a dataset, returning the run evicted to make room, if any.
    pub fn insert(&mut self, run: RunId, dataset: Arc<dyn GriddedDataset>) -> Option<RunId> {
        match self.cache.push(run, dataset) {
            Some((evicted, _)) if evicted != run => {
                self.evictions += 1;
                Some(evicted)
            }
            _ => None,
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.cache.len(),
            evictions: self.evictions,
        }
    }

    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdata::InMemoryDataset;
    use chrono::NaiveDate;
    use gfs_common::RunHour;

    fn run(day: u32, hour: RunHour) -> RunId {
        RunId::new(NaiveDate::from_ymd_opt(2024, 1, day).unwrap(), hour)
    }

    fn dataset(name: &str) -> Arc<dyn GriddedDataset> {
        Arc::new(InMemoryDataset::new(name))
    }

    #[test]
    fn test_cache_insert_and_get() {
        let mut cache = DatasetCache::new(4);
        let key = run(15, RunHour::Z00);

        assert!(cache.get(&key).is_none());
        cache.insert(key, dataset("a"));
        assert_eq!(cache.get(&key).unwrap().name(), "a");
    }

    #[test]
    fn test_cache_lru_eviction() {
        let mut cache = DatasetCache::new(2);
        let a = run(15, RunHour::Z00);
        let b = run(15, RunHour::Z06);
        let c = run(15, RunHour::Z12);

        cache.insert(a, dataset("a"));
        cache.insert(b, dataset("b"));
        // Touch a so b becomes least recently used.
        cache.get(&a);

        assert_eq!(cache.insert(c, dataset("c")), Some(b));
        assert!(cache.contains(&a));
        assert!(!cache.contains(&b));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_reinsert_same_key_is_not_eviction() {
        let mut cache = DatasetCache::new(1);
        let a = run(15, RunHour::Z00);
        cache.insert(a, dataset("a"));
        assert_eq!(cache.insert(a, dataset("a2")), None);
        assert_eq!(cache.stats().evictions, 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_stats() {
        let mut cache = DatasetCache::new(4);
        let a = run(15, RunHour::Z00);
        cache.insert(a, dataset("a"));

        cache.get(&a);
        cache.get(&run(16, RunHour::Z00));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let cache = DatasetCache::new(0);
        assert_eq!(cache.capacity(), 1);
        assert!(cache.is_empty());
    }
}
