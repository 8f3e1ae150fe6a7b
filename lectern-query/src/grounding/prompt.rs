//! Judge prompt construction and response parsing.

use lectern_core::{
    LecternError, Material, Result, SupportedClaim, UnsupportedClaim,
};
use regex::Regex;
use serde::Deserialize;
use std::fmt::Write;
use std::sync::Arc;
use tracing::warn;

/// System prompt for the grounding judge.
pub const JUDGE_SYSTEM_PROMPT: &str = "You are a meticulous, deterministic fact-checker for \
course Q&A answers. Break the answer into individual factual claims and decide, for each one, \
whether the numbered source excerpts support it. If you are uncertain whether a claim is \
supported, mark it as unsupported. Respond with JSON only.";

const RESPONSE_FORMAT: &str = r#"Respond with a single JSON object in exactly this format:
{
  "supported_claims": [
    {"claim": "<claim text>", "supporting_materials": [<source numbers>], "confidence": <0.0-1.0>}
  ],
  "unsupported_claims": [
    {"claim": "<claim text>", "reason": "<why it is unsupported>", "severity": "low|medium|high"}
  ],
  "summary": "<one or two sentences>"
}"#;

/// Build the user prompt for a grounding check.
///
/// Materials are numbered from 1 and their content is truncated to
/// `max_excerpt_chars` characters.
pub fn build_user_prompt(
    answer: &str,
    materials: &[Arc<Material>],
    question: Option<&str>,
    max_excerpt_chars: usize,
) -> String {
    let mut prompt = String::new();

    if let Some(question) = question.filter(|q| !q.trim().is_empty()) {
        let _ = writeln!(prompt, "QUESTION:\n{question}\n");
    }

    prompt.push_str("SOURCE MATERIALS:\n");
    if materials.is_empty() {
        prompt.push_str("(none)\n");
    }
    for (index, material) in materials.iter().enumerate() {
        let _ = writeln!(
            prompt,
            "[{}] {} ({})\n{}\n",
            index + 1,
            material.title,
            material.material_type,
            truncate_chars(&material.content, max_excerpt_chars)
        );
    }

    let _ = writeln!(prompt, "\nANSWER TO VERIFY:\n{answer}\n");
    prompt.push_str(RESPONSE_FORMAT);
    prompt
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text.to_string(),
    }
}

/// Claims extracted from a judge response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JudgeVerdict {
    /// Claims the judge found support for.
    pub supported_claims: Vec<SupportedClaim>,
    /// Claims without support.
    pub unsupported_claims: Vec<UnsupportedClaim>,
    /// Judge-written summary, if any.
    pub summary: Option<String>,
    /// Whether the response was well-formed.
    pub well_formed: bool,
}

#[derive(Debug, Deserialize)]
struct JudgeOutput {
    #[serde(default)]
    supported_claims: Vec<SupportedClaim>,
    #[serde(default)]
    unsupported_claims: Vec<UnsupportedClaim>,
    #[serde(default)]
    summary: Option<String>,
}

/// Parses judge output, tolerating code fences and malformed JSON.
#[derive(Debug, Clone)]
pub struct JudgeResponseParser {
    fence: Regex,
}

impl JudgeResponseParser {
    /// Create a parser.
    pub fn new() -> Result<Self> {
        let fence = Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```")
            .map_err(|e| LecternError::internal(format!("Invalid fence regex: {e}")))?;
        Ok(Self { fence })
    }

    /// Extract the JSON payload from `text`.
    ///
    /// Prefers the first fenced code block, then the outermost braces, then
    /// the raw text.
    pub fn extract_json<'t>(&self, text: &'t str) -> &'t str {
        if let Some(body) = self.fence.captures(text).and_then(|c| c.get(1)) {
            return body.as_str().trim();
        }
        match (text.find('{'), text.rfind('}')) {
            (Some(start), Some(end)) if start < end => &text[start..=end],
            _ => text.trim(),
        }
    }

    /// Parse a judge response.
    ///
    /// Malformed output yields an empty verdict. Support indices outside
    /// `1..=material_count` are dropped while the claim itself is kept.
    pub fn parse(&self, text: &str, material_count: usize) -> JudgeVerdict {
        let payload = self.extract_json(text);
        let output: JudgeOutput = match serde_json::from_str(payload) {
            Ok(output) => output,
            Err(e) => {
                warn!("Malformed judge output, treating as no claims: {}", e);
                return JudgeVerdict::default();
            }
        };

        let supported_claims = output
            .supported_claims
            .into_iter()
            .map(|mut claim| {
                claim
                    .supporting_materials
                    .retain(|index| (1..=material_count).contains(index));
                claim.confidence = claim.confidence.clamp(0.0, 1.0);
                claim
            })
            .collect();

        JudgeVerdict {
            supported_claims,
            unsupported_claims: output.unsupported_claims,
            summary: output.summary.filter(|s| !s.trim().is_empty()),
            well_formed: true,
        }
    }
}
