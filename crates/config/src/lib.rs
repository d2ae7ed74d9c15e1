//! Configuration management for the WhatsApp sales agent
//!
//! Supports loading configuration from:
//! - YAML files (config/default.yaml, config/{env}.yaml)
//! - Environment variables (ZAP_AGENT__ prefix)
//!
//! Secrets (WhatsApp access token, verify token, LLM API key) are expected
//! to come from the environment.

pub mod sales;
pub mod settings;

pub use sales::{KeywordRules, SalesConfig, TypingDelayConfig};
pub use settings::{
    load_settings, LlmSettings, ObservabilityConfig, RuntimeEnvironment, ServerConfig, Settings,
    WhatsAppConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
