//! LLM Integration
//!
//! Features:
//! - OpenAI-compatible chat completion backend behind the `LlmBackend` trait
//! - Voice-note transcription (speech-to-text endpoint)
//! - Stage-conditioned sales prompt construction

pub mod backend;
pub mod prompt;

pub use backend::{LlmBackend, OpenAiBackend};
pub use prompt::{build_system_prompt, Message, Role};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Network(err.to_string())
    }
}

impl From<LlmError> for zap_agent_core::Error {
    fn from(err: LlmError) -> Self {
        zap_agent_core::Error::Llm(err.to_string())
    }
}
