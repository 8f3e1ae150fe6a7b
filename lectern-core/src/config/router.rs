//! Configuration for confidence scoring and adaptive routing.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{ConfidenceLevel, LecternError, Result};

/// Score thresholds separating the confidence tiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceThresholds {
    /// Scores at or above this are `High`.
    pub high: f32,
    /// Scores at or above this (and below `high`) are `Medium`.
    pub low: f32,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            high: 80.0,
            low: 50.0,
        }
    }
}

impl ConfidenceThresholds {
    /// Map a score to its tier.
    pub fn level_for(&self, score: f32) -> ConfidenceLevel {
        if score >= self.high {
            ConfidenceLevel::High
        } else if score >= self.low {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    /// Validate `0 <= low < high <= 100`.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.low) || !(0.0..=100.0).contains(&self.high) {
            return Err(LecternError::configuration(
                "Confidence thresholds must be between 0 and 100",
            ));
        }
        if self.low >= self.high {
            return Err(LecternError::configuration(format!(
                "Low threshold ({}) must be below high threshold ({})",
                self.low, self.high
            )));
        }
        Ok(())
    }
}

/// Cache TTL per confidence tier, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheTtlConfig {
    /// TTL for high-confidence queries.
    pub high_secs: u64,
    /// TTL for medium-confidence queries.
    pub medium_secs: u64,
    /// TTL for low-confidence queries.
    pub low_secs: u64,
}

impl Default for CacheTtlConfig {
    fn default() -> Self {
        Self {
            high_secs: 24 * 3600,
            medium_secs: 6 * 3600,
            low_secs: 3600,
        }
    }
}

impl CacheTtlConfig {
    /// TTL for a confidence tier.
    pub fn ttl_for(&self, level: ConfidenceLevel) -> Duration {
        let secs = match level {
            ConfidenceLevel::High => self.high_secs,
            ConfidenceLevel::Medium => self.medium_secs,
            ConfidenceLevel::Low => self.low_secs,
        };
        Duration::from_secs(secs)
    }
}

/// Adaptive router configuration.
///
/// # Examples
///
/// ```rust
/// use lectern_core::config::RouterConfig;
/// use lectern_core::ConfidenceLevel;
///
/// let config = RouterConfig::default();
/// assert_eq!(config.thresholds.level_for(85.0), ConfidenceLevel::High);
/// assert_eq!(config.ttl.ttl_for(ConfidenceLevel::Low).as_secs(), 3600);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Confidence tier thresholds.
    pub thresholds: ConfidenceThresholds,

    /// Medium-band scores below this use expanded retrieval.
    pub expansion_threshold: f32,

    /// Whether high-confidence results are cached and served from cache.
    pub enable_caching: bool,

    /// Whether expanded retrieval may be chosen.
    pub enable_expansion: bool,

    /// Whether aggressive retrieval may be chosen.
    pub enable_aggressive: bool,

    /// TTL per confidence tier.
    pub ttl: CacheTtlConfig,

    /// Maximum number of cached results.
    pub max_cache_size: usize,

    /// Estimated cost of one retrieval, used for the savings metric.
    pub cost_per_retrieval: f64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            thresholds: ConfidenceThresholds::default(),
            expansion_threshold: 65.0,
            enable_caching: true,
            enable_expansion: true,
            enable_aggressive: true,
            ttl: CacheTtlConfig::default(),
            max_cache_size: 1000,
            cost_per_retrieval: 0.01,
        }
    }
}

impl RouterConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;

        if self.expansion_threshold < self.thresholds.low
            || self.expansion_threshold > self.thresholds.high
        {
            return Err(LecternError::configuration(format!(
                "expansion_threshold ({}) must lie within [{}, {}]",
                self.expansion_threshold, self.thresholds.low, self.thresholds.high
            )));
        }
        if self.max_cache_size == 0 {
            return Err(LecternError::configuration(
                "max_cache_size must be at least 1",
            ));
        }
        if self.ttl.high_secs == 0 || self.ttl.medium_secs == 0 || self.ttl.low_secs == 0 {
            return Err(LecternError::configuration("Cache TTLs must be positive"));
        }
        if !self.cost_per_retrieval.is_finite() || self.cost_per_retrieval < 0.0 {
            return Err(LecternError::configuration(
                "cost_per_retrieval must be a non-negative number",
            ));
        }
        Ok(())
    }
}
