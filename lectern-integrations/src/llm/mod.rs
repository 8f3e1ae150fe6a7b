//! LLM-backed grounding judge.

pub mod config;
pub mod error;
pub mod judge;

pub use config::{JudgeClientConfig, JudgeProvider};
pub use error::JudgeError;
pub use judge::SiumaiCompletionModel;
