//! In-memory memoization of expensive results.
//!
//! Results are keyed by a function name plus the JSON serialization of its
//! arguments and live for the lifetime of the process. There is no
//! eviction; the inputs are a few thousand areas and the parameter space
//! real clients explore is small.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

use crate::error::Result;

/// Thread-safe memo table
#[derive(Debug)]
pub struct MemoCache<V> {
    entries: RwLock<HashMap<String, Arc<V>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Hit/miss counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

impl<V> Default for MemoCache<V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }
}

impl<V> MemoCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache key for a call
    pub fn key<A: Serialize + ?Sized>(function: &str, args: &A) -> Result<String> {
        Ok(format!("{}:{}", function, serde_json::to_string(args)?))
    }

    /// Cached result of a call, if any
    pub fn get<A: Serialize + ?Sized>(&self, function: &str, args: &A) -> Result<Option<Arc<V>>> {
        let key = Self::key(function, args)?;
        Ok(self.entries.read().get(&key).cloned())
    }

    /// Return the cached result or compute and store it.
    ///
    /// `compute` runs without the lock held. Errors are returned and not
    /// cached. If two callers race on the same key the first stored value
    /// wins and both get it.
    pub fn get_or_try_insert<A, F>(&self, function: &str, args: &A, compute: F) -> Result<Arc<V>>
    where
        A: Serialize + ?Sized,
        F: FnOnce() -> Result<V>,
    {
        let key = Self::key(function, args)?;

        if let Some(value) = self.entries.read().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(function, "Cache hit");
            return Ok(Arc::clone(value));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        trace!(function, "Cache miss");
        let value = Arc::new(compute()?);

        let mut entries = self.entries.write();
        Ok(Arc::clone(entries.entry(key).or_insert(value)))
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BandMapError;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_second_call_is_served_from_cache() {
        let cache: MemoCache<f64> = MemoCache::new();
        let calls = AtomicUsize::new(0);
        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(42.0)
        };

        let a = cache.get_or_try_insert("area", &json!({"v_min": 0}), compute).unwrap();
        let b = cache
            .get_or_try_insert("area", &json!({"v_min": 0}), || Ok(0.0))
            .unwrap();

        assert_eq!(*a, 42.0);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            cache.stats(),
            CacheStats {
                entries: 1,
                hits: 1,
                misses: 1
            }
        );
    }

    #[test]
    fn test_key_includes_function_and_args() {
        let cache: MemoCache<String> = MemoCache::new();
        cache
            .get_or_try_insert("bands", &(0, 120, 30), || Ok("a".to_string()))
            .unwrap();
        cache
            .get_or_try_insert("bands", &(0, 120, 20), || Ok("b".to_string()))
            .unwrap();
        cache
            .get_or_try_insert("layers", &(0, 120, 30), || Ok("c".to_string()))
            .unwrap();
        assert_eq!(cache.len(), 3);
        assert_eq!(
            cache.get("bands", &(0, 120, 20)).unwrap().as_deref(),
            Some(&"b".to_string())
        );
        assert!(cache.get("bands", &(1, 2, 3)).unwrap().is_none());
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache: MemoCache<u32> = MemoCache::new();
        let result = cache.get_or_try_insert("f", "x", || {
            Err(BandMapError::Server {
                message: "boom".to_string(),
            })
        });
        assert!(result.is_err());
        assert!(cache.is_empty());

        let value = cache.get_or_try_insert("f", "x", || Ok(7)).unwrap();
        assert_eq!(*value, 7);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_shared_across_threads() {
        let cache: Arc<MemoCache<usize>> = Arc::new(MemoCache::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    *cache
                        .get_or_try_insert("square", &(i % 2), || Ok((i % 2) * 10))
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            let value = handle.join().unwrap();
            assert!(value == 0 || value == 10);
        }
        assert_eq!(cache.len(), 2);
    }
}
