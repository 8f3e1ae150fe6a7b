//! In-memory route cache.
//!
//! A mutex-guarded map with per-entry TTL and least-recently-accessed
//! eviction. Every operation takes the lock, so concurrent queries served by
//! one router never race on reads, writes or evictions.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::ConfidenceLevel;
use crate::traits::{CacheStats, RouteCache};

/// Default maximum number of entries.
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

/// A cached value with its bookkeeping.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    /// The cached value
    value: V,
    /// Confidence of the query that wrote the entry
    confidence: ConfidenceLevel,
    /// When the entry was written
    written_at: Instant,
    /// TTL measured from `written_at`
    ttl: Duration,
    /// Number of hits served
    access_count: u64,
    /// Last hit (or write) time
    last_accessed: Instant,
    /// Monotonic recency stamp, used for eviction ordering
    recency: u64,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.written_at) >= self.ttl
    }
}

#[derive(Debug)]
struct CacheState<V> {
    entries: HashMap<String, CacheEntry<V>>,
    stats: CacheStats,
    clock: u64,
}

impl<V> CacheState<V> {
    fn next_tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn purge_expired(&mut self, now: Instant) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - self.entries.len();
        if removed > 0 {
            self.stats.expirations += removed as u64;
            debug!("Purged {} expired cache entries", removed);
        }
    }

    fn evict_to(&mut self, max_entries: usize) {
        while self.entries.len() > max_entries {
            let Some(victim) = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.recency)
                .map(|(key, _)| key.clone())
            else {
                break;
            };
            self.entries.remove(&victim);
            self.stats.evictions += 1;
            debug!("Evicted least recently accessed cache entry: {}", victim);
        }
    }
}

/// In-memory [`RouteCache`] implementation.
///
/// # Example
///
/// ```rust
/// use lectern_core::cache::MemoryRouteCache;
/// use lectern_core::traits::RouteCache;
/// use lectern_core::ConfidenceLevel;
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() {
/// let cache = MemoryRouteCache::new(100);
/// cache
///     .put("what-is-recursion".to_string(), 42_u32, ConfidenceLevel::High, Duration::from_secs(60))
///     .await;
/// assert_eq!(cache.get("what-is-recursion").await, Some(42));
/// # }
/// ```
#[derive(Debug)]
pub struct MemoryRouteCache<V> {
    state: Mutex<CacheState<V>>,
    max_entries: usize,
}

impl<V> MemoryRouteCache<V> {
    /// Create a cache holding at most `max_entries` entries (at least one).
    pub fn new(max_entries: usize) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                stats: CacheStats::default(),
                clock: 0,
            }),
            max_entries: max_entries.max(1),
        }
    }

    /// Maximum number of entries.
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Confidence level recorded for `key`, if present and unexpired.
    ///
    /// Does not count as an access.
    pub async fn confidence_of(&self, key: &str) -> Option<ConfidenceLevel> {
        let state = self.state.lock().await;
        let now = Instant::now();
        state
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.confidence)
    }

    /// Hits served by `key`, if present.
    pub async fn access_count(&self, key: &str) -> Option<u64> {
        let state = self.state.lock().await;
        state.entries.get(key).map(|entry| entry.access_count)
    }
}

impl<V> Default for MemoryRouteCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

#[async_trait]
impl<V> RouteCache<V> for MemoryRouteCache<V>
where
    V: Clone + Send + Sync + std::fmt::Debug + 'static,
{
    async fn get(&self, key: &str) -> Option<V> {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        let Some(expired) = state.entries.get(key).map(|entry| entry.is_expired(now)) else {
            state.stats.misses += 1;
            debug!("Cache miss for key: {}", key);
            return None;
        };

        if expired {
            state.entries.remove(key);
            state.stats.expirations += 1;
            state.stats.misses += 1;
            state.stats.entries = state.entries.len();
            debug!("Cache entry expired for key: {}", key);
            return None;
        }

        let tick = state.next_tick();
        state.stats.hits += 1;
        let entry = state.entries.get_mut(key)?;
        entry.access_count += 1;
        entry.last_accessed = now;
        entry.recency = tick;
        debug!("Cache hit for key: {} (hits: {})", key, entry.access_count);
        Some(entry.value.clone())
    }

    async fn put(&self, key: String, value: V, confidence: ConfidenceLevel, ttl: Duration) {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        state.purge_expired(now);

        let tick = state.next_tick();
        state.entries.insert(
            key.clone(),
            CacheEntry {
                value,
                confidence,
                written_at: now,
                ttl,
                access_count: 0,
                last_accessed: now,
                recency: tick,
            },
        );
        state.evict_to(self.max_entries);
        state.stats.entries = state.entries.len();

        info!(
            "Cached result for key: {} (confidence: {}, ttl: {}s)",
            key,
            confidence,
            ttl.as_secs()
        );
    }

    async fn remove(&self, key: &str) -> bool {
        let mut state = self.state.lock().await;
        let removed = state.entries.remove(key).is_some();
        state.stats.entries = state.entries.len();
        removed
    }

    async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.entries.clear();
        state.stats.entries = 0;
        info!("Route cache cleared");
    }

    async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    async fn stats(&self) -> CacheStats {
        let state = self.state.lock().await;
        let mut stats = state.stats.clone();
        stats.entries = state.entries.len();
        stats
    }
}
