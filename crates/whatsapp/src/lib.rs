//! WhatsApp Cloud API integration
//!
//! - `client` - outbound send, media URL resolution, media download
//! - `webhook` - inbound envelope payload types

pub mod client;
pub mod webhook;

pub use client::{MediaLocation, WhatsAppClient};
pub use webhook::{InboundMessage, MediaRef, MessageKind, TextBody, WebhookEnvelope};

use thiserror::Error;

/// WhatsApp API errors
#[derive(Error, Debug)]
pub enum WhatsAppError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for WhatsAppError {
    fn from(err: reqwest::Error) -> Self {
        WhatsAppError::Network(err.to_string())
    }
}

impl From<WhatsAppError> for zap_agent_core::Error {
    fn from(err: WhatsAppError) -> Self {
        zap_agent_core::Error::WhatsApp(err.to_string())
    }
}
