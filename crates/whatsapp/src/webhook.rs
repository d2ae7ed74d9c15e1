//! Webhook envelope payload types
//!
//! The Cloud API delivers one message per POST, nested as
//! `entry[0].changes[0].value.messages[0]`. Everything is optional on the
//! wire: status-only deliveries carry no `messages` array at all, and those
//! must be acknowledged silently.

use serde::{Deserialize, Serialize};

/// Top-level webhook envelope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookEnvelope {
    #[serde(default)]
    pub entry: Vec<Entry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub changes: Vec<Change>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Change {
    #[serde(default)]
    pub value: ChangeValue,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub messages: Vec<InboundMessage>,
}

/// Message type discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    Audio,
    Image,
    Video,
    Document,
    /// Anything the agent has no handling for (stickers, reactions, ...)
    #[serde(other)]
    #[default]
    Unsupported,
}

/// One inbound message
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Sender phone number (session key)
    pub from: String,
    /// Provider message id (dedupe key)
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<MediaRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<MediaRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<MediaRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<MediaRef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextBody {
    pub body: String,
}

/// Reference to an uploaded media object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl WebhookEnvelope {
    /// Extract the single inbound message, if any
    pub fn into_message(mut self) -> Option<InboundMessage> {
        let entry = if self.entry.is_empty() {
            return None;
        } else {
            self.entry.swap_remove(0)
        };
        let mut change = entry.changes.into_iter().next()?;
        if change.value.messages.is_empty() {
            None
        } else {
            Some(change.value.messages.swap_remove(0))
        }
    }
}

impl InboundMessage {
    /// Text body for text messages
    pub fn text_body(&self) -> Option<&str> {
        self.text.as_ref().map(|t| t.body.as_str())
    }

    /// Media reference for audio messages
    pub fn audio_ref(&self) -> Option<&MediaRef> {
        self.audio.as_ref()
    }
}
