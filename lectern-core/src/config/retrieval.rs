//! Configuration for lexical, dense and hybrid retrieval.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{LecternError, Result};

/// BM25 algorithm parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Params {
    /// Term frequency saturation parameter.
    pub k1: f32,

    /// Length normalization parameter, in `0.0..=1.0`.
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75 }
    }
}

impl Bm25Params {
    /// Validate the parameters.
    pub fn validate(&self) -> Result<()> {
        if !self.k1.is_finite() || self.k1 < 0.0 {
            return Err(LecternError::configuration(format!(
                "BM25 k1 must be a non-negative number, got {}",
                self.k1
            )));
        }
        if !(0.0..=1.0).contains(&self.b) {
            return Err(LecternError::configuration(format!(
                "BM25 b must be between 0.0 and 1.0, got {}",
                self.b
            )));
        }
        Ok(())
    }
}

/// Retrieval configuration.
///
/// # Examples
///
/// ```rust
/// use lectern_core::config::RetrievalConfig;
///
/// let config = RetrievalConfig::default();
/// assert_eq!(config.rrf_k, 60.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// BM25 parameters for the lexical retriever.
    pub bm25: Bm25Params,

    /// Reciprocal rank fusion smoothing constant.
    pub rrf_k: f32,

    /// Each sub-retriever is asked for `limit * headroom` results before fusion.
    pub headroom: usize,

    /// RRF weight of the lexical list.
    pub lexical_weight: f32,

    /// RRF weight of the dense list.
    pub dense_weight: f32,

    /// MMR relevance/novelty trade-off, in `0.0..=1.0`.
    pub mmr_lambda: f32,

    /// Number of results returned when the caller gives no limit.
    pub default_limit: usize,

    /// Timeout for one embedding call, in seconds.
    pub embed_timeout_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            bm25: Bm25Params::default(),
            rrf_k: 60.0,
            headroom: 2,
            lexical_weight: 1.0,
            dense_weight: 1.0,
            mmr_lambda: 0.7,
            default_limit: 5,
            embed_timeout_secs: 30,
        }
    }
}

impl RetrievalConfig {
    /// Embedding timeout as a [`Duration`].
    pub fn embed_timeout(&self) -> Duration {
        Duration::from_secs(self.embed_timeout_secs)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.bm25.validate()?;

        if !self.rrf_k.is_finite() || self.rrf_k <= 0.0 {
            return Err(LecternError::configuration("rrf_k must be positive"));
        }
        if self.headroom == 0 {
            return Err(LecternError::configuration("headroom must be at least 1"));
        }
        for (name, weight) in [
            ("lexical_weight", self.lexical_weight),
            ("dense_weight", self.dense_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(LecternError::configuration(format!(
                    "{name} must be a non-negative number"
                )));
            }
        }
        if self.lexical_weight == 0.0 && self.dense_weight == 0.0 {
            return Err(LecternError::configuration(
                "At least one fusion weight must be positive",
            ));
        }
        if !(0.0..=1.0).contains(&self.mmr_lambda) {
            return Err(LecternError::configuration(format!(
                "mmr_lambda must be between 0.0 and 1.0, got {}",
                self.mmr_lambda
            )));
        }
        if self.default_limit == 0 {
            return Err(LecternError::configuration(
                "default_limit must be at least 1",
            ));
        }
        if self.embed_timeout_secs == 0 {
            return Err(LecternError::configuration(
                "embed_timeout_secs must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_default_is_valid() {
        assert!(RetrievalConfig::default().validate().is_ok());
    }

    #[test_case(Bm25Params { k1: -0.1, b: 0.75 } ; "negative k1")]
    #[test_case(Bm25Params { k1: 1.2, b: 1.5 } ; "b above one")]
    #[test_case(Bm25Params { k1: f32::NAN, b: 0.5 } ; "nan k1")]
    fn test_invalid_bm25(params: Bm25Params) {
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_invalid_lambda() {
        let config = RetrievalConfig {
            mmr_lambda: 1.2,
            ..RetrievalConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(LecternError::Configuration { .. })
        ));
    }

    #[test]
    fn test_zero_weights_rejected() {
        let config = RetrievalConfig {
            lexical_weight: 0.0,
            dense_weight: 0.0,
            ..RetrievalConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
