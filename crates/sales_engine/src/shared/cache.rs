use contracts::dashboards::d410_sales_overview::{FilterKey, SalesOverview};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

/// Counters exposed for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    /// Number of wholesale invalidations so far
    pub generation: u64,
}

/// Memoized aggregation results, one entry per filter tuple.
///
/// Entries are stored behind `Arc` and never mutated after insertion.
/// There is no per-key invalidation: a new dataset clears everything.
#[derive(Debug)]
pub struct AggregationCache<K = FilterKey, V = SalesOverview> {
    entries: HashMap<K, Arc<V>>,
    hits: u64,
    misses: u64,
    generation: u64,
}

impl<K, V> Default for AggregationCache<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
            generation: 0,
        }
    }
}

impl<K, V> AggregationCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored entry for `key`, computing and storing it on first request.
    pub fn get_or_compute<F>(&mut self, key: &K, compute: F) -> Arc<V>
    where
        F: FnOnce() -> V,
    {
        if let Some(entry) = self.entries.get(key) {
            self.hits += 1;
            tracing::debug!("aggregation cache hit: {:?}", key);
            return Arc::clone(entry);
        }

        self.misses += 1;
        tracing::debug!("aggregation cache miss: {:?}", key);
        let entry = Arc::new(compute());
        self.entries.insert(key.clone(), Arc::clone(&entry));
        entry
    }

    /// Like [`get_or_compute`](Self::get_or_compute); nothing is stored when
    /// `compute` fails.
    pub fn get_or_try_compute<F, E>(&mut self, key: &K, compute: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(entry) = self.entries.get(key) {
            self.hits += 1;
            tracing::debug!("aggregation cache hit: {:?}", key);
            return Ok(Arc::clone(entry));
        }

        self.misses += 1;
        let entry = Arc::new(compute()?);
        self.entries.insert(key.clone(), Arc::clone(&entry));
        Ok(entry)
    }

    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.entries.get(key).cloned()
    }

    /// Drop every entry. Called whenever the underlying records are replaced.
    pub fn invalidate_all(&mut self) {
        let dropped = self.entries.len();
        self.entries.clear();
        self.generation += 1;
        tracing::debug!(
            "aggregation cache cleared: {} entries dropped, generation {}",
            dropped,
            self.generation
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
            generation: self.generation,
        }
    }
}
