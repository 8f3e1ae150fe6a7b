//! Text completion trait used by LLM-as-judge components.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// A single completion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// System prompt.
    pub system_prompt: String,
    /// User prompt.
    pub user_prompt: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: usize,
}

/// Result of a completion call as reported by the provider.
///
/// Providers that signal failure in-band set `success = false` and fill
/// `error`; transport failures are returned as `Err` instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Whether the provider produced content.
    pub success: bool,
    /// Generated text, when successful.
    pub content: Option<String>,
    /// Provider error message, when unsuccessful.
    pub error: Option<String>,
}

impl CompletionResponse {
    /// A successful response.
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            success: true,
            content: Some(content.into()),
            error: None,
        }
    }

    /// An unsuccessful response.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            content: None,
            error: Some(error.into()),
        }
    }
}

/// Injected completion capability.
#[async_trait]
pub trait CompletionModel: Send + Sync + std::fmt::Debug {
    /// Run one completion.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Get a human-readable name for this model.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
