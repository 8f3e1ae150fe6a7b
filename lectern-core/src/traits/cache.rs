//! Route cache trait.
//!
//! The adaptive router stores results behind this interface so single- and
//! multi-threaded hosts share identical routing logic. Implementations must
//! serialise reads, writes and evictions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ConfidenceLevel;

/// Cache of routed results keyed by normalised query.
///
/// Entries expire strictly `ttl` after they were written. Reads refresh an
/// entry's recency for eviction purposes but never its expiry.
#[async_trait]
pub trait RouteCache<V>: Send + Sync + std::fmt::Debug
where
    V: Clone + Send + Sync + 'static,
{
    /// Look up `key`, deleting and missing on an expired entry.
    async fn get(&self, key: &str) -> Option<V>;

    /// Store `value` under `key`, then evict least-recently-accessed entries
    /// while over capacity.
    async fn put(&self, key: String, value: V, confidence: ConfidenceLevel, ttl: Duration);

    /// Remove `key`, returning whether it was present.
    async fn remove(&self, key: &str) -> bool;

    /// Remove every entry.
    async fn clear(&self);

    /// Number of entries currently held, including not-yet-collected expired ones.
    async fn len(&self) -> usize;

    /// Whether the cache holds no entries.
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Snapshot of cache statistics.
    async fn stats(&self) -> CacheStats;
}

/// Cache statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses (including expired entries).
    pub misses: u64,
    /// Entries currently held.
    pub entries: usize,
    /// Entries removed to respect the size limit.
    pub evictions: u64,
    /// Entries removed because their TTL elapsed.
    pub expirations: u64,
}

impl CacheStats {
    /// Hit rate in `0.0..=1.0`.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..CacheStats::default()
        };
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }
}
