//! Configuration for the grounding verifier.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{LecternError, Result};

/// Grounding verifier configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Minimum score for an answer to count as grounded.
    pub threshold: f32,

    /// Require zero unsupported claims instead of a score threshold.
    pub strict_mode: bool,

    /// Characters of each material included in the judge prompt.
    pub max_excerpt_chars: usize,

    /// Token budget for the judge response.
    pub max_tokens: usize,

    /// Timeout for one judge call, in seconds.
    pub judge_timeout_secs: u64,

    /// Sampling temperature for the judge.
    pub temperature: f32,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            threshold: 0.7,
            strict_mode: false,
            max_excerpt_chars: 1500,
            max_tokens: 2000,
            judge_timeout_secs: 30,
            temperature: 0.0,
        }
    }
}

impl VerifierConfig {
    /// Judge timeout as a [`Duration`].
    pub fn judge_timeout(&self) -> Duration {
        Duration::from_secs(self.judge_timeout_secs)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(LecternError::configuration(format!(
                "Grounding threshold must be between 0.0 and 1.0, got {}",
                self.threshold
            )));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(LecternError::configuration(format!(
                "Judge temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }
        if self.max_excerpt_chars == 0 {
            return Err(LecternError::configuration(
                "max_excerpt_chars must be at least 1",
            ));
        }
        if self.max_tokens == 0 {
            return Err(LecternError::configuration("max_tokens must be at least 1"));
        }
        if self.judge_timeout_secs == 0 {
            return Err(LecternError::configuration(
                "judge_timeout_secs must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VerifierConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.strict_mode);
        assert_eq!(config.judge_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_threshold_out_of_range() {
        let config = VerifierConfig {
            threshold: 1.5,
            ..VerifierConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
