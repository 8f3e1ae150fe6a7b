//! LLM-judged grounding verification.

use chrono::Utc;
use lectern_core::{
    GroundingLevel, GroundingRequest, GroundingResult, Result,
    config::VerifierConfig,
    traits::{CompletionModel, CompletionRequest},
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::prompt::{JUDGE_SYSTEM_PROMPT, JudgeResponseParser, JudgeVerdict, build_user_prompt};

/// Score reported when the judge cannot be consulted.
pub const FALLBACK_SCORE: f32 = 0.5;

/// Checks whether an answer's claims are supported by source materials.
///
/// An injected [`CompletionModel`] acts as the judge. Verification never
/// fails: judge errors, timeouts and unsuccessful responses produce a
/// conservative partially-grounded result that is not considered grounded.
#[derive(Debug)]
pub struct GroundingVerifier {
    judge: Arc<dyn CompletionModel>,
    config: VerifierConfig,
    parser: JudgeResponseParser,
}

impl GroundingVerifier {
    /// Create a verifier. Fails if `config` is invalid.
    pub fn new(judge: Arc<dyn CompletionModel>, config: VerifierConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            judge,
            config,
            parser: JudgeResponseParser::new()?,
        })
    }

    /// Verifier configuration.
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verify `request.answer` against `request.materials`.
    #[instrument(skip_all, fields(materials = request.materials.len(), judge = self.judge.name()))]
    pub async fn verify(&self, request: GroundingRequest) -> GroundingResult {
        let threshold = request.threshold.unwrap_or(self.config.threshold);

        let completion = CompletionRequest {
            system_prompt: JUDGE_SYSTEM_PROMPT.to_string(),
            user_prompt: build_user_prompt(
                &request.answer,
                &request.materials,
                request.question.as_deref(),
                self.config.max_excerpt_chars,
            ),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response =
            match tokio::time::timeout(self.config.judge_timeout(), self.judge.complete(completion))
                .await
            {
                Err(_) => {
                    return Self::fallback(format!(
                        "judge timed out after {}s",
                        self.config.judge_timeout_secs
                    ));
                }
                Ok(Err(e)) => return Self::fallback(format!("judge call failed: {e}")),
                Ok(Ok(response)) => response,
            };

        if !response.success {
            let reason = response.error.unwrap_or_else(|| "unknown error".to_string());
            return Self::fallback(format!("judge reported failure: {reason}"));
        }
        let Some(content) = response.content.filter(|c| !c.trim().is_empty()) else {
            return Self::fallback("judge returned an empty response".to_string());
        };

        let verdict = self.parser.parse(&content, request.materials.len());
        let result = self.score(verdict, threshold);

        info!(
            "Grounding score {:.2} ({}), grounded: {}",
            result.score, result.level, result.is_grounded
        );
        result
    }

    fn score(&self, verdict: JudgeVerdict, threshold: f32) -> GroundingResult {
        let supported = verdict.supported_claims.len();
        let unsupported = verdict.unsupported_claims.len();
        let total = supported + unsupported;

        let score = if total == 0 {
            0.0
        } else {
            supported as f32 / total as f32
        };
        let is_grounded = if self.config.strict_mode {
            unsupported == 0
        } else {
            score >= threshold
        };
        debug!(
            "{} supported, {} unsupported claims (strict: {})",
            supported, unsupported, self.config.strict_mode
        );

        let summary = verdict.summary.unwrap_or_else(|| {
            if total == 0 {
                "No verifiable claims were identified".to_string()
            } else {
                format!("{supported} of {total} claims are supported by the materials")
            }
        });

        GroundingResult {
            score,
            is_grounded,
            level: GroundingLevel::from_score(score),
            supported_claims: verdict.supported_claims,
            unsupported_claims: verdict.unsupported_claims,
            summary,
            checked_at: Utc::now(),
        }
    }

    fn fallback(reason: String) -> GroundingResult {
        warn!("Grounding check degraded: {}", reason);
        GroundingResult {
            score: FALLBACK_SCORE,
            is_grounded: false,
            level: GroundingLevel::PartiallyGrounded,
            supported_claims: Vec::new(),
            unsupported_claims: Vec::new(),
            summary: format!("Grounding check unavailable: {reason}"),
            checked_at: Utc::now(),
        }
    }
}
