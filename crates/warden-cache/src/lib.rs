//! # Warden Cache - Materialization Memoization
//!
//! Rules without `@input` references materialize identically for the
//! lifetime of a (subject, action, context) triple, so their materialized
//! form can be memoized. The cache is pure memoization keyed by a context
//! hash: safe to evict or recompute at any time, never an authority.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde_json::Value;

use warden_core::Rule;

/// Cache key for a materialized rule set.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct MaterializationKey {
    pub subject: String,
    pub action: String,
    pub context_hash: u64,
}

impl MaterializationKey {
    pub fn new(subject: impl Into<String>, action: impl Into<String>, context: &Value) -> Self {
        Self {
            subject: subject.into(),
            action: action.into(),
            context_hash: context_hash(context),
        }
    }
}

/// Hash of the context's JSON rendering. Two logically equal contexts
/// built with different key orders may hash apart; that only costs a
/// recomputation, never a wrong answer.
pub fn context_hash(context: &Value) -> u64 {
    let rendered = context.to_string();
    let mut hasher = DefaultHasher::new();
    rendered.hash(&mut hasher);
    hasher.finish()
}

/// Counters exposed for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entry_count: u64,
}

/// In-memory cache of materialized rule sets.
pub struct MaterializationCache {
    cache: Cache<MaterializationKey, Arc<Vec<Rule>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MaterializationCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();

        Self {
            cache,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub async fn get(&self, key: &MaterializationKey) -> Option<Arc<Vec<Rule>>> {
        let result = self.cache.get(key).await;
        if result.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    pub async fn put(&self, key: MaterializationKey, rules: Vec<Rule>) {
        self.cache.insert(key, Arc::new(rules)).await;
    }

    /// Drop every entry, e.g. after a rule-source reload.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: self.cache.entry_count(),
        }
    }
}

impl Default for MaterializationCache {
    fn default() -> Self {
        Self::new(10_000, Duration::from_secs(300))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_hit_and_miss_accounting() {
        let cache = MaterializationCache::default();
        let key = MaterializationKey::new("Users", "getAll", &json!({"currentUserId": 1}));

        assert!(cache.get(&key).await.is_none());
        cache
            .put(key.clone(), vec![Rule::new("getAll", "Users")])
            .await;
        assert!(cache.get(&key).await.is_some());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_context_changes_the_key() {
        let cache = MaterializationCache::default();
        let key_a = MaterializationKey::new("Users", "getAll", &json!({"currentUserId": 1}));
        let key_b = MaterializationKey::new("Users", "getAll", &json!({"currentUserId": 2}));

        cache
            .put(key_a.clone(), vec![Rule::new("getAll", "Users")])
            .await;
        assert!(cache.get(&key_b).await.is_none());
        assert_ne!(key_a.context_hash, key_b.context_hash);
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let cache = MaterializationCache::default();
        let key = MaterializationKey::new("Users", "getAll", &json!({}));
        cache
            .put(key.clone(), vec![Rule::new("getAll", "Users")])
            .await;

        cache.invalidate_all();
        assert!(cache.get(&key).await.is_none());
    }
}
