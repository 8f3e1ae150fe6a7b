//! Confidence-driven adaptive router with tiered result caching.

use lectern_core::{
    ConfidenceLevel, ConfidenceScore, Result, RouteOutcome, RoutingAction, RoutingDecision,
    cache::MemoryRouteCache,
    config::RouterConfig,
    traits::{CacheStats, ConfidenceScorer, RouteCache},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

/// Normalize a query into a cache key.
///
/// Lowercases, trims, drops punctuation and joins words with `-`, so queries
/// differing only in case, spacing or punctuation share a key.
///
/// ```rust
/// use lectern_query::routing::normalize_cache_key;
///
/// assert_eq!(normalize_cache_key("  What is Recursion?? "), "what-is-recursion");
/// ```
pub fn normalize_cache_key(query: &str) -> String {
    let cleaned: String = query
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join("-")
}

/// Routing statistics since construction or the last reset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouterMetrics {
    /// Queries routed.
    pub total_queries: u64,
    /// Queries per chosen action.
    pub action_counts: HashMap<RoutingAction, u64>,
    /// Queries per confidence level.
    pub level_counts: HashMap<ConfidenceLevel, u64>,
    /// Running mean of confidence scores.
    pub average_confidence: f64,
    /// High-confidence lookups answered from cache.
    pub cache_hits: u64,
    /// High-confidence lookups that missed.
    pub cache_misses: u64,
    /// Estimated retrieval cost avoided by cache hits.
    pub cost_savings: f64,
}

impl RouterMetrics {
    /// Number of queries routed to `action`.
    pub fn count_for(&self, action: RoutingAction) -> u64 {
        self.action_counts.get(&action).copied().unwrap_or(0)
    }

    /// Cache hit rate over high-confidence lookups.
    pub fn cache_hit_rate(&self) -> f64 {
        let lookups = self.cache_hits + self.cache_misses;
        if lookups == 0 {
            0.0
        } else {
            self.cache_hits as f64 / lookups as f64
        }
    }

    fn record(&mut self, action: RoutingAction, confidence: &ConfidenceScore) {
        self.total_queries += 1;
        *self.action_counts.entry(action).or_insert(0) += 1;
        *self.level_counts.entry(confidence.level).or_insert(0) += 1;
        self.average_confidence +=
            (f64::from(confidence.score) - self.average_confidence) / self.total_queries as f64;
    }
}

/// Decides how much retrieval effort a query deserves and serves repeated
/// high-confidence queries from cache.
///
/// | Confidence | Action |
/// |------------|--------|
/// | high, cached | `use_cache` |
/// | high | `retrieve_standard` |
/// | medium, below expansion threshold | `retrieve_expanded` |
/// | medium | `retrieve_standard` |
/// | low | `retrieve_aggressive` |
///
/// Disabled actions fall back to the next cheaper one.
#[derive(Debug)]
pub struct AdaptiveRouter<V>
where
    V: Clone + Send + Sync + 'static,
{
    scorer: Arc<dyn ConfidenceScorer>,
    cache: Arc<dyn RouteCache<V>>,
    config: RouterConfig,
    metrics: Mutex<RouterMetrics>,
}

impl<V> AdaptiveRouter<V>
where
    V: Clone + Send + Sync + Debug + 'static,
{
    /// Create a router with an in-memory cache sized from `config`.
    pub fn with_memory_cache(
        scorer: Arc<dyn ConfidenceScorer>,
        config: RouterConfig,
    ) -> Result<Self> {
        let cache = Arc::new(MemoryRouteCache::new(config.max_cache_size));
        Self::new(scorer, cache, config)
    }
}

impl<V> AdaptiveRouter<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a router. Fails if `config` is invalid.
    pub fn new(
        scorer: Arc<dyn ConfidenceScorer>,
        cache: Arc<dyn RouteCache<V>>,
        config: RouterConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            scorer,
            cache,
            config,
            metrics: Mutex::new(RouterMetrics::default()),
        })
    }

    /// Router configuration.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Score `query` and choose a routing action.
    ///
    /// The confidence tier always comes from this router's thresholds, not
    /// from the level the scorer reports.
    ///
    /// A cache hit returns a `use_cache` decision together with the cached
    /// value; every other decision carries no value.
    #[instrument(skip(self, history), fields(history = history.len()))]
    pub async fn route_query(&self, query: &str, history: &[String]) -> Result<RouteOutcome<V>> {
        let mut confidence = self.scorer.score(query, history).await?;
        let level = self.config.thresholds.level_for(confidence.score);
        if level != confidence.level {
            debug!(
                "Scorer reported {} for {:.1}; router thresholds give {}",
                confidence.level, confidence.score, level
            );
            confidence.level = level;
        }
        let high = confidence.level == ConfidenceLevel::High;
        let cache_key = high.then(|| normalize_cache_key(query));

        if self.config.enable_caching {
            if let Some(key) = &cache_key {
                if let Some(value) = self.cache.get(key).await {
                    let reasoning = Self::reasoning(RoutingAction::UseCache, &confidence);
                    let decision = RoutingDecision::new(
                        RoutingAction::UseCache,
                        reasoning,
                        cache_key.clone(),
                        confidence,
                    );
                    self.record(&decision, Some(true)).await;
                    info!("Routed to {} (key: {})", decision.action, key);
                    return Ok(RouteOutcome {
                        decision,
                        cached: Some(value),
                    });
                }
            }
        }
        let lookup = (self.config.enable_caching && high).then_some(false);

        let action = self.select_action(&confidence);
        let reasoning = Self::reasoning(action, &confidence);
        let decision = RoutingDecision::new(action, reasoning, cache_key, confidence);
        self.record(&decision, lookup).await;

        info!(
            "Routed to {} (confidence {:.1}, {})",
            decision.action, decision.confidence.score, decision.confidence.level
        );
        Ok(RouteOutcome {
            decision,
            cached: None,
        })
    }

    fn select_action(&self, confidence: &ConfidenceScore) -> RoutingAction {
        let config = &self.config;
        match confidence.level {
            ConfidenceLevel::High => RoutingAction::RetrieveStandard,
            ConfidenceLevel::Medium
                if config.enable_expansion && confidence.score < config.expansion_threshold =>
            {
                RoutingAction::RetrieveExpanded
            }
            ConfidenceLevel::Medium => RoutingAction::RetrieveStandard,
            ConfidenceLevel::Low if config.enable_aggressive => RoutingAction::RetrieveAggressive,
            ConfidenceLevel::Low if config.enable_expansion => RoutingAction::RetrieveExpanded,
            ConfidenceLevel::Low => RoutingAction::RetrieveStandard,
        }
    }

    fn reasoning(action: RoutingAction, confidence: &ConfidenceScore) -> String {
        let score = confidence.score;
        match action {
            RoutingAction::UseCache => {
                format!("High confidence ({score:.1}); serving cached result")
            }
            RoutingAction::RetrieveStandard => match confidence.level {
                ConfidenceLevel::High => {
                    format!("High confidence ({score:.1}); standard retrieval")
                }
                level => format!("{level} confidence ({score:.1}); standard retrieval"),
            },
            RoutingAction::RetrieveExpanded => format!(
                "{} confidence ({score:.1}); expanding retrieval for broader coverage",
                confidence.level
            ),
            RoutingAction::RetrieveAggressive => format!(
                "Low confidence ({score:.1}); aggressive retrieval with hierarchy traversal"
            ),
        }
    }

    async fn record(&self, decision: &RoutingDecision, lookup_hit: Option<bool>) {
        let mut metrics = self.metrics.lock().await;
        metrics.record(decision.action, &decision.confidence);
        match lookup_hit {
            Some(true) => {
                metrics.cache_hits += 1;
                metrics.cost_savings = metrics.cache_hits as f64 * self.config.cost_per_retrieval;
            }
            Some(false) => metrics.cache_misses += 1,
            None => {}
        }
    }

    /// Cache `value` for `query` with a TTL chosen by `confidence`.
    ///
    /// Does nothing when caching is disabled.
    pub async fn cache_result(&self, query: &str, value: V, confidence: ConfidenceLevel) {
        if !self.config.enable_caching {
            debug!("Caching disabled; not storing result");
            return;
        }
        let key = normalize_cache_key(query);
        let ttl = self.config.ttl.ttl_for(confidence);
        self.cache.put(key, value, confidence, ttl).await;
    }

    /// Look up a cached value by normalized key.
    pub async fn get_from_cache(&self, key: &str) -> Option<V> {
        self.cache.get(key).await
    }

    /// Drop every cached entry.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    /// Cache statistics.
    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// Snapshot of routing metrics.
    pub async fn metrics(&self) -> RouterMetrics {
        self.metrics.lock().await.clone()
    }

    /// Reset routing metrics.
    pub async fn reset_metrics(&self) {
        *self.metrics.lock().await = RouterMetrics::default();
        info!("Router metrics reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use async_trait::async_trait;
    use lectern_core::config::ConfidenceThresholds;
    use std::time::Duration;
    use test_case::test_case;

    /// Returns a fixed score regardless of the query.
    #[derive(Debug)]
    struct FixedScorer(f32);

    #[async_trait]
    impl ConfidenceScorer for FixedScorer {
        async fn score(&self, _query: &str, _history: &[String]) -> Result<ConfidenceScore> {
            let level = ConfidenceThresholds::default().level_for(self.0);
            Ok(ConfidenceScore::new(self.0, level))
        }
    }

    fn router(score: f32, config: RouterConfig) -> AdaptiveRouter<String> {
        AdaptiveRouter::with_memory_cache(Arc::new(FixedScorer(score)), config).unwrap()
    }

    #[test_case(90.0, RoutingAction::RetrieveStandard ; "high")]
    #[test_case(70.0, RoutingAction::RetrieveStandard ; "upper medium")]
    #[test_case(55.0, RoutingAction::RetrieveExpanded ; "lower medium")]
    #[test_case(20.0, RoutingAction::RetrieveAggressive ; "low")]
    #[tokio::test]
    async fn test_action_by_score(score: f32, expected: RoutingAction) {
        let outcome = router(score, RouterConfig::default())
            .route_query("q", &[])
            .await
            .unwrap();
        assert_eq!(outcome.decision.action, expected);
        assert!(outcome.cached.is_none());
    }

    #[tokio::test]
    async fn test_disabled_actions_fall_back() {
        let config = RouterConfig {
            enable_aggressive: false,
            ..RouterConfig::default()
        };
        let outcome = router(20.0, config).route_query("q", &[]).await.unwrap();
        assert_eq!(outcome.decision.action, RoutingAction::RetrieveExpanded);

        let config = RouterConfig {
            enable_aggressive: false,
            enable_expansion: false,
            ..RouterConfig::default()
        };
        let outcome = router(20.0, config).route_query("q", &[]).await.unwrap();
        assert_eq!(outcome.decision.action, RoutingAction::RetrieveStandard);
    }

    #[tokio::test]
    async fn test_cache_key_only_for_high_confidence() {
        let high = router(90.0, RouterConfig::default())
            .route_query("What is a Heap?", &[])
            .await
            .unwrap();
        assert_eq!(high.decision.cache_key.as_deref(), Some("what-is-a-heap"));

        let low = router(30.0, RouterConfig::default())
            .route_query("What is a Heap?", &[])
            .await
            .unwrap();
        assert!(low.decision.cache_key.is_none());
    }

    #[tokio::test]
    async fn test_cache_hit_after_write() {
        let router = router(90.0, RouterConfig::default());
        router
            .cache_result("What is recursion?", "cached".to_string(), ConfidenceLevel::High)
            .await;

        let outcome = router.route_query("what is RECURSION", &[]).await.unwrap();
        assert_eq!(outcome.decision.action, RoutingAction::UseCache);
        assert!(!outcome.decision.should_retrieve);
        assert_eq!(outcome.cached.as_deref(), Some("cached"));

        let metrics = router.metrics().await;
        assert_eq!(metrics.cache_hits, 1);
        assert_relative_eq!(metrics.cost_savings, 0.01);
    }

    #[tokio::test]
    async fn test_metrics_track_actions_and_average() {
        let router = router(90.0, RouterConfig::default());
        router.route_query("a", &[]).await.unwrap();
        router.route_query("b", &[]).await.unwrap();

        let metrics = router.metrics().await;
        assert_eq!(metrics.total_queries, 2);
        assert_eq!(metrics.count_for(RoutingAction::RetrieveStandard), 2);
        assert_eq!(metrics.cache_misses, 2);
        assert_relative_eq!(metrics.average_confidence, 90.0);

        router.reset_metrics().await;
        assert_eq!(router.metrics().await.total_queries, 0);
    }

    #[tokio::test]
    async fn test_caching_disabled() {
        let config = RouterConfig {
            enable_caching: false,
            ..RouterConfig::default()
        };
        let router = router(90.0, config);
        router
            .cache_result("q", "v".to_string(), ConfidenceLevel::High)
            .await;
        assert_eq!(router.cache_stats().await.entries, 0);

        let outcome = router.route_query("q", &[]).await.unwrap();
        assert_eq!(outcome.decision.action, RoutingAction::RetrieveStandard);
        assert_eq!(router.metrics().await.cache_misses, 0);
    }

    #[tokio::test]
    async fn test_router_thresholds_override_scorer_level() {
        let config = RouterConfig {
            thresholds: ConfidenceThresholds {
                high: 95.0,
                low: 40.0,
            },
            ..RouterConfig::default()
        };
        let outcome = router(90.0, config).route_query("q", &[]).await.unwrap();
        assert_eq!(outcome.decision.confidence.level, ConfidenceLevel::Medium);
        assert_eq!(outcome.decision.action, RoutingAction::RetrieveStandard);
        assert!(outcome.decision.cache_key.is_none());

        let config = RouterConfig {
            thresholds: ConfidenceThresholds {
                high: 80.0,
                low: 60.0,
            },
            ..RouterConfig::default()
        };
        let outcome = router(45.0, config).route_query("q", &[]).await.unwrap();
        assert_eq!(outcome.decision.confidence.level, ConfidenceLevel::Low);
        assert_eq!(outcome.decision.action, RoutingAction::RetrieveAggressive);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cached_query_retrieves_again_after_ttl() {
        let router = router(90.0, RouterConfig::default());
        router
            .cache_result("What is a trie?", "cached".to_string(), ConfidenceLevel::High)
            .await;

        let hit = router.route_query("What is a trie?", &[]).await.unwrap();
        assert_eq!(hit.decision.action, RoutingAction::UseCache);

        let high_ttl = router.config().ttl.ttl_for(ConfidenceLevel::High);
        tokio::time::advance(high_ttl + Duration::from_secs(1)).await;

        let miss = router.route_query("What is a trie?", &[]).await.unwrap();
        assert_eq!(miss.decision.action, RoutingAction::RetrieveStandard);
        assert!(miss.cached.is_none());
        assert_eq!(router.metrics().await.cache_misses, 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = RouterConfig {
            max_cache_size: 0,
            ..RouterConfig::default()
        };
        let result: Result<AdaptiveRouter<String>> =
            AdaptiveRouter::with_memory_cache(Arc::new(FixedScorer(50.0)), config);
        assert!(result.is_err());
    }

    #[test_case("Hello,   World!", "hello-world")]
    #[test_case("  C++ vs. Rust?  ", "c-vs-rust")]
    #[test_case("???", "")]
    fn test_normalize_cache_key(input: &str, expected: &str) {
        assert_eq!(normalize_cache_key(input), expected);
    }
}
