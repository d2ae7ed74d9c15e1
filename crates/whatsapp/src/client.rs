//! WhatsApp Cloud API client

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use zap_agent_config::WhatsAppConfig;

use crate::WhatsAppError;

/// Cloud API client: text sends and two-step media retrieval
#[derive(Clone)]
pub struct WhatsAppClient {
    client: Client,
    config: WhatsAppConfig,
}

#[derive(Serialize)]
struct SendTextRequest<'a> {
    messaging_product: &'static str,
    to: &'a str,
    text: SendTextBody<'a>,
}

#[derive(Serialize)]
struct SendTextBody<'a> {
    body: &'a str,
}

#[derive(Deserialize)]
struct MediaUrlResponse {
    url: String,
    #[serde(default)]
    mime_type: Option<String>,
}

/// Resolved media download target
#[derive(Debug, Clone)]
pub struct MediaLocation {
    pub url: String,
    pub mime_type: Option<String>,
}

impl WhatsAppClient {
    /// Create a new client from config
    pub fn new(config: WhatsAppConfig) -> Result<Self, WhatsAppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                WhatsAppError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, config })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base.trim_end_matches('/'), path)
    }

    /// Send a plain text message
    pub async fn send_text(&self, to: &str, body: &str) -> Result<(), WhatsAppError> {
        let request = SendTextRequest {
            messaging_product: "whatsapp",
            to,
            text: SendTextBody { body },
        };

        let response = self
            .client
            .post(self.api_url(&format!("{}/messages", self.config.phone_number_id)))
            .bearer_auth(&self.config.access_token)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(WhatsAppError::Api(format!("{}: {}", status, body)));
        }

        tracing::debug!(to = %to, chars = body.len(), "Outbound message sent");
        Ok(())
    }

    /// Resolve a media id to its signed download URL
    pub async fn media_location(&self, media_id: &str) -> Result<MediaLocation, WhatsAppError> {
        let response = self
            .client
            .get(self.api_url(media_id))
            .bearer_auth(&self.config.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(WhatsAppError::Api(format!("{}: {}", status, body)));
        }

        let parsed: MediaUrlResponse = response
            .json()
            .await
            .map_err(|e| WhatsAppError::InvalidResponse(e.to_string()))?;

        Ok(MediaLocation {
            url: parsed.url,
            mime_type: parsed.mime_type,
        })
    }

    /// Download media bytes from a signed URL.
    ///
    /// The signed URL still requires the bearer token.
    pub async fn download_media(&self, location: &MediaLocation) -> Result<Vec<u8>, WhatsAppError> {
        let response = self
            .client
            .get(&location.url)
            .bearer_auth(&self.config.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(WhatsAppError::Api(format!(
                "media download failed: {}",
                response.status()
            )));
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }

    /// Operator number for hand-off alerts
    pub fn operator_number(&self) -> &str {
        &self.config.operator_number
    }
}
