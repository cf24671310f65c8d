//! Bounded result cache for `expand_query`/`rerank` (§4.2: "keyed by a hash
//! of `(operation, query, doc_identifier_or_model)`... a probabilistic sweep
//! (~1%) keeps cache <= 1000 entries").

use std::num::NonZeroUsize;

use clawmem_core::constants::{LLM_CACHE_MAX_ENTRIES, LLM_CACHE_SWEEP_PROBABILITY};
use lru::LruCache;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

/// Compute the cache key for `(operation, query, extra)`, where `extra` is
/// the document identifier for `rerank` or the embedding model name for
/// `expand_query`.
#[must_use]
pub fn cache_key(operation: &str, query: &str, extra: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(operation.as_bytes());
    hasher.update([0]);
    hasher.update(query.as_bytes());
    hasher.update([0]);
    hasher.update(extra.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// A bounded, thread-safe cache keyed by [`cache_key`]. Eviction is both
/// LRU-capacity-bound and probabilistically swept on insert, matching the
/// teacher's "cheap enough not to need a background reaper" caching style.
pub struct ResultCache<V> {
    inner: Mutex<LruCache<String, V>>,
}

impl<V: Clone> ResultCache<V> {
    #[must_use]
    pub fn new() -> Self {
        let cap = NonZeroUsize::new(LLM_CACHE_MAX_ENTRIES).unwrap_or(NonZeroUsize::MIN);
        ResultCache {
            inner: Mutex::new(LruCache::new(cap)),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<V> {
        self.inner.lock().get(key).cloned()
    }

    pub fn put(&self, key: String, value: V) {
        let mut guard = self.inner.lock();
        guard.put(key, value);
        if rand::random::<f64>() < LLM_CACHE_SWEEP_PROBABILITY {
            while guard.len() > LLM_CACHE_MAX_ENTRIES {
                guard.pop_lru();
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone> Default for ResultCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_is_stable_and_order_sensitive() {
        let a = cache_key("rerank", "query", "doc1");
        let b = cache_key("rerank", "query", "doc1");
        let c = cache_key("rerank", "query", "doc2");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn put_then_get_round_trips() {
        let cache: ResultCache<Vec<String>> = ResultCache::new();
        let key = cache_key("expand_query", "q", "model-a");
        cache.put(key.clone(), vec!["x".to_string()]);
        assert_eq!(cache.get(&key), Some(vec!["x".to_string()]));
    }

    #[test]
    fn miss_returns_none() {
        let cache: ResultCache<u32> = ResultCache::new();
        assert_eq!(cache.get("nonexistent"), None);
    }
}
