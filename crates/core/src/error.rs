//! Shared error type

use thiserror::Error;

/// Crate-spanning error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("WhatsApp API error: {0}")]
    WhatsApp(String),
}

/// Result alias for the shared error type
pub type Result<T> = std::result::Result<T, Error>;
