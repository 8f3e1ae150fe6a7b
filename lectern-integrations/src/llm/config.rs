//! Configuration for the siumai judge client.

use serde::{Deserialize, Serialize};

use super::error::JudgeError;

/// Providers the judge client can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JudgeProvider {
    /// OpenAI chat completions
    OpenAi,
    /// Anthropic messages API
    Anthropic,
    /// Local Ollama server
    Ollama,
}

impl JudgeProvider {
    /// Provider name as used in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Ollama => "ollama",
        }
    }

    /// Whether the provider needs an API key.
    pub fn requires_api_key(self) -> bool {
        !matches!(self, Self::Ollama)
    }
}

/// Settings for building a judge client.
///
/// Sampling parameters are fixed at client build time; the judge always runs
/// at `temperature` 0.0 unless overridden here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeClientConfig {
    /// Provider to use.
    pub provider: JudgeProvider,

    /// Model name, e.g. `gpt-4o-mini`.
    pub model: String,

    /// API key, required by hosted providers.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Custom base URL.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Sampling temperature.
    #[serde(default)]
    pub temperature: f32,

    /// Maximum tokens in the judge reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_max_tokens() -> u32 {
    2000
}

impl JudgeClientConfig {
    /// OpenAI configuration.
    pub fn openai(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::new(JudgeProvider::OpenAi, model).with_api_key(api_key)
    }

    /// Anthropic configuration.
    pub fn anthropic(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::new(JudgeProvider::Anthropic, model).with_api_key(api_key)
    }

    /// Ollama configuration against `http://localhost:11434`.
    pub fn ollama(model: impl Into<String>) -> Self {
        Self::new(JudgeProvider::Ollama, model).with_base_url("http://localhost:11434")
    }

    fn new(provider: JudgeProvider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            api_key: None,
            base_url: None,
            temperature: 0.0,
            max_tokens: default_max_tokens(),
        }
    }

    /// Set the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set a custom base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the maximum reply length.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), JudgeError> {
        if self.model.trim().is_empty() {
            return Err(JudgeError::configuration("Judge model must not be empty"));
        }
        if self.provider.requires_api_key()
            && self.api_key.as_deref().is_none_or(|k| k.trim().is_empty())
        {
            return Err(JudgeError::configuration(format!(
                "Provider {} requires an API key",
                self.provider.name()
            )));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(JudgeError::configuration(format!(
                "Judge temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(JudgeError::configuration("Judge max_tokens must be positive"));
        }
        Ok(())
    }
}
