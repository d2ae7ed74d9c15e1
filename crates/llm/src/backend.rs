//! LLM backend implementations
//!
//! One production backend: an OpenAI-compatible HTTP API used for both
//! chat completion and voice-note transcription. The trait exists so the
//! agent engine can be tested with a mock.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use zap_agent_config::LlmSettings;

use crate::prompt::Message;
use crate::LlmError;

/// LLM backend trait
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generate a chat reply for the given messages. Returns the text of
    /// the first choice, trimmed; `Ok(None)` when the model returned an
    /// empty completion.
    async fn chat(&self, messages: &[Message]) -> Result<Option<String>, LlmError>;

    /// Transcribe a voice note to text
    async fn transcribe(&self, audio: Vec<u8>, mime_type: &str) -> Result<String, LlmError>;

    /// Model name (for logging)
    fn model_name(&self) -> &str;
}

/// OpenAI-compatible backend
#[derive(Clone)]
pub struct OpenAiBackend {
    client: Client,
    settings: LlmSettings,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    max_tokens: usize,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

impl OpenAiBackend {
    /// Create a new backend from settings
    pub fn new(settings: LlmSettings) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, settings })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.settings.endpoint.trim_end_matches('/'), path)
    }

    fn bearer(&self) -> &str {
        self.settings.api_key.as_deref().unwrap_or("")
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn chat(&self, messages: &[Message]) -> Result<Option<String>, LlmError> {
        let request = ChatRequest {
            model: &self.settings.model,
            messages,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        let response = self
            .client
            .post(self.api_url("/chat/completions"))
            .bearer_auth(self.bearer())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("{}: {}", status, body)));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Ok(text)
    }

    async fn transcribe(&self, audio: Vec<u8>, mime_type: &str) -> Result<String, LlmError> {
        let file_name = match mime_type.split(';').next().unwrap_or_default() {
            "audio/mpeg" => "voice.mp3",
            "audio/mp4" => "voice.m4a",
            "audio/wav" => "voice.wav",
            // WhatsApp voice notes are opus-in-ogg
            _ => "voice.ogg",
        };

        let part = reqwest::multipart::Part::bytes(audio)
            .file_name(file_name)
            .mime_str(mime_type.split(';').next().unwrap_or("audio/ogg"))
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .text("model", self.settings.transcription_model.clone())
            .part("file", part);

        let response = self
            .client
            .post(self.api_url("/audio/transcriptions"))
            .bearer_auth(self.bearer())
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("{}: {}", status, body)));
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Ok(parsed.text.trim().to_string())
    }

    fn model_name(&self) -> &str {
        &self.settings.model
    }
}
