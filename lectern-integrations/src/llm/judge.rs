//! Grounding judge backed by a siumai chat client.

use async_trait::async_trait;
use lectern_core::{
    Result,
    traits::{CompletionModel, CompletionRequest, CompletionResponse},
};
use siumai::prelude::*;
use tracing::{debug, instrument, warn};

use super::{
    config::{JudgeClientConfig, JudgeProvider},
    error::JudgeError,
};

/// A [`CompletionModel`] that sends judge prompts through siumai.
///
/// siumai fixes sampling parameters when the client is built, so the
/// request's `temperature` and `max_tokens` are expected to match the client
/// configuration. [`SiumaiCompletionModel::connect`] builds a client at the
/// judge's deterministic settings.
///
/// # Examples
///
/// ```rust,no_run
/// use lectern_integrations::llm::{JudgeClientConfig, SiumaiCompletionModel};
///
/// # async fn example() -> lectern_core::Result<()> {
/// let judge = SiumaiCompletionModel::connect(
///     &JudgeClientConfig::openai("gpt-4o-mini", std::env::var("OPENAI_API_KEY").unwrap_or_default()),
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```
pub struct SiumaiCompletionModel {
    client: Siumai,
    model: String,
}

impl std::fmt::Debug for SiumaiCompletionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiumaiCompletionModel")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl SiumaiCompletionModel {
    /// Wrap an existing client.
    pub fn new(client: Siumai, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Build a client from `config`.
    pub async fn connect(config: &JudgeClientConfig) -> Result<Self> {
        config.validate()?;

        let client = match config.provider {
            JudgeProvider::OpenAi => {
                let mut builder = Siumai::builder().openai();
                if let Some(api_key) = &config.api_key {
                    builder = builder.api_key(api_key);
                }
                if let Some(base_url) = &config.base_url {
                    builder = builder.base_url(base_url);
                }
                builder
                    .model(&config.model)
                    .temperature(config.temperature)
                    .max_tokens(config.max_tokens)
                    .build()
                    .await
            }
            JudgeProvider::Anthropic => {
                let mut builder = Siumai::builder().anthropic();
                if let Some(api_key) = &config.api_key {
                    builder = builder.api_key(api_key);
                }
                if let Some(base_url) = &config.base_url {
                    builder = builder.base_url(base_url);
                }
                builder
                    .model(&config.model)
                    .temperature(config.temperature)
                    .max_tokens(config.max_tokens)
                    .build()
                    .await
            }
            JudgeProvider::Ollama => {
                let base_url = config
                    .base_url
                    .as_deref()
                    .unwrap_or("http://localhost:11434");
                Siumai::builder()
                    .ollama()
                    .base_url(base_url)
                    .model(&config.model)
                    .temperature(config.temperature)
                    .max_tokens(config.max_tokens)
                    .build()
                    .await
            }
        }
        .map_err(|e| {
            JudgeError::configuration(format!("Failed to create siumai client: {e}"))
        })?;

        Ok(Self::new(client, config.model.clone()))
    }

    /// Model name the client was built for.
    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Join the system and user prompts into one user turn.
pub(crate) fn judge_prompt(request: &CompletionRequest) -> String {
    if request.system_prompt.trim().is_empty() {
        request.user_prompt.clone()
    } else {
        format!("{}\n\n{}", request.system_prompt, request.user_prompt)
    }
}

#[async_trait]
impl CompletionModel for SiumaiCompletionModel {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!(
            "Judge request: {} prompt chars, temperature {}, max_tokens {}",
            request.user_prompt.len(),
            request.temperature,
            request.max_tokens
        );
        let messages = vec![ChatMessage::user(judge_prompt(&request)).build()];

        let response = self
            .client
            .chat(messages)
            .await
            .map_err(|e| JudgeError::Siumai(e.to_string()))?;

        match &response.content {
            siumai::MessageContent::Text(text) => Ok(CompletionResponse::ok(text.clone())),
            _ => {
                let error = JudgeError::UnsupportedContent {
                    kind: "non-text message".to_string(),
                };
                warn!("{}", error);
                Ok(CompletionResponse::failed(error.to_string()))
            }
        }
    }

    fn name(&self) -> &'static str {
        "siumai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(system_prompt: &str) -> CompletionRequest {
        CompletionRequest {
            system_prompt: system_prompt.to_string(),
            user_prompt: "ANSWER TO VERIFY:\nx".to_string(),
            temperature: 0.0,
            max_tokens: 10,
        }
    }

    #[test]
    fn test_prompt_joins_system_and_user() {
        assert_eq!(
            judge_prompt(&request("Check facts.")),
            "Check facts.\n\nANSWER TO VERIFY:\nx"
        );
        assert_eq!(judge_prompt(&request(" ")), "ANSWER TO VERIFY:\nx");
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_config() {
        let config = JudgeClientConfig::openai("gpt-4o-mini", "");
        let err = SiumaiCompletionModel::connect(&config).await.unwrap_err();
        assert!(err.is_client_error());
    }
}
