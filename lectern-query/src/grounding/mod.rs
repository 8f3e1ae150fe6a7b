//! Grounding verification of generated answers.

pub mod prompt;
pub mod verifier;

pub use prompt::{JUDGE_SYSTEM_PROMPT, JudgeResponseParser, JudgeVerdict, build_user_prompt};
pub use verifier::{FALLBACK_SCORE, GroundingVerifier};
