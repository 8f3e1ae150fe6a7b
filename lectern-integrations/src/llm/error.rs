//! Error types for the LLM judge integration.

use lectern_core::LecternError;
use thiserror::Error;

/// Errors raised while building or calling a judge client.
#[derive(Error, Debug)]
pub enum JudgeError {
    /// Invalid client configuration
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// The provider rejected or failed the request
    #[error("Siumai error: {0}")]
    Siumai(String),

    /// The provider answered with something other than text
    #[error("Unsupported response content: {kind}")]
    UnsupportedContent {
        /// Description of the content received
        kind: String,
    },
}

impl JudgeError {
    /// Create a configuration error.
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

impl From<JudgeError> for LecternError {
    fn from(error: JudgeError) -> Self {
        match error {
            JudgeError::Configuration { message } => Self::Configuration { message },
            other => Self::Llm {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_keeps_category() {
        let err: LecternError = JudgeError::configuration("missing api key").into();
        assert!(err.is_client_error());

        let err: LecternError = JudgeError::Siumai("503".to_string()).into();
        assert!(matches!(err, LecternError::Llm { .. }));
        assert!(err.to_string().contains("503"));
    }
}
