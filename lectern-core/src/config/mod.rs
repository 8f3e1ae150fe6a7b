//! Configuration types for Lectern.
//!
//! Every component has its own serializable configuration with a
//! `validate()` method. [`LecternConfig`] bundles them and can be loaded from
//! TOML, where any omitted field takes its default.

pub mod retrieval;
pub mod router;
pub mod traversal;
pub mod verifier;

pub use retrieval::*;
pub use router::*;
pub use traversal::*;
pub use verifier::*;

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::{LecternError, Result};

/// Top-level configuration.
///
/// # Examples
///
/// ```rust
/// use lectern_core::config::LecternConfig;
///
/// let config = LecternConfig::from_toml_str(
///     r#"
///     [router]
///     expansion_threshold = 70.0
///
///     [traversal]
///     strategy = "depth_first"
///     max_depth = 3
///     "#,
/// )
/// .unwrap();
///
/// assert_eq!(config.router.expansion_threshold, 70.0);
/// assert_eq!(config.traversal.max_depth, Some(3));
/// assert_eq!(config.retrieval.rrf_k, 60.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LecternConfig {
    /// Retrieval settings.
    pub retrieval: RetrievalConfig,
    /// Routing and caching settings.
    pub router: RouterConfig,
    /// Grounding verifier settings.
    pub verifier: VerifierConfig,
    /// Hierarchy traversal settings.
    pub traversal: TraversalConfig,
}

impl LecternConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            LecternError::configuration(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Serialize to a TOML document.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| {
            LecternError::configuration(format!("Failed to serialize config: {e}"))
        })
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.retrieval.validate()?;
        self.router.validate()?;
        self.verifier.validate()?;
        self.traversal.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = LecternConfig::from_toml_str("").unwrap();
        assert_eq!(config, LecternConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = LecternConfig::from_toml_str(
            r#"
            [retrieval.bm25]
            k1 = 1.2

            [router.ttl]
            high_secs = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.retrieval.bm25.k1, 1.2);
        assert_eq!(config.retrieval.bm25.b, 0.75);
        assert_eq!(config.router.ttl.high_secs, 60);
        assert_eq!(config.router.ttl.low_secs, 3600);
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let err = LecternConfig::from_toml_str(
            r#"
            [retrieval]
            mmr_lambda = 2.0
            "#,
        )
        .unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_malformed_toml_is_configuration_error() {
        let err = LecternConfig::from_toml_str("[router").unwrap_err();
        assert!(matches!(err, LecternError::Configuration { .. }));
    }

    #[test]
    fn test_toml_round_trip_preserves_values() {
        let mut config = LecternConfig::default();
        config.verifier.strict_mode = true;
        config.traversal.max_depth = Some(4);

        let text = config.to_toml_string().unwrap();
        assert_eq!(LecternConfig::from_toml_str(&text).unwrap(), config);
    }
}
