//! Per-sender dispatch workers
//!
//! The webhook handler acknowledges immediately and enqueues the message
//! here. Each sender gets one worker task fed by an unbounded channel, so
//! turns for the same sender are processed strictly in order while
//! different senders run concurrently. Workers live for the process
//! lifetime, like the sessions they drive.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::mpsc;

use zap_agent_agent::{AgentEngine, HandoffAlert, InboundText, SessionStore};
use zap_agent_config::TypingDelayConfig;
use zap_agent_llm::LlmBackend;
use zap_agent_whatsapp::{InboundMessage, MessageKind, WhatsAppClient};

use crate::leads::LeadLog;

/// Routes inbound messages to per-sender workers and delivers replies
pub struct Dispatcher {
    engine: Arc<AgentEngine>,
    llm: Arc<dyn LlmBackend>,
    whatsapp: Arc<WhatsAppClient>,
    sessions: Arc<SessionStore>,
    leads: Arc<LeadLog>,
    typing: TypingDelayConfig,
    queues: DashMap<String, mpsc::UnboundedSender<InboundMessage>>,
}

impl Dispatcher {
    pub fn new(
        engine: Arc<AgentEngine>,
        llm: Arc<dyn LlmBackend>,
        whatsapp: Arc<WhatsAppClient>,
        sessions: Arc<SessionStore>,
        leads: Arc<LeadLog>,
        typing: TypingDelayConfig,
    ) -> Self {
        Self {
            engine,
            llm,
            whatsapp,
            sessions,
            leads,
            typing,
            queues: DashMap::new(),
        }
    }

    /// Hand one inbound message to its sender's worker, spawning the
    /// worker on first contact.
    pub fn enqueue(self: &Arc<Self>, message: InboundMessage) {
        if message.from.is_empty() {
            tracing::warn!(message_id = %message.id, "Inbound message without sender dropped");
            return;
        }

        let tx = self
            .queues
            .entry(message.from.clone())
            .or_insert_with(|| self.spawn_worker(message.from.clone()))
            .clone();

        // The worker loop only ends when the sender is dropped, which
        // cannot happen while the queue map still holds it
        if tx.send(message).is_err() {
            tracing::error!("Dispatch worker channel closed unexpectedly");
        }
    }

    fn spawn_worker(self: &Arc<Self>, sender: String) -> mpsc::UnboundedSender<InboundMessage> {
        let (tx, mut rx) = mpsc::unbounded_channel::<InboundMessage>();
        let dispatcher = Arc::clone(self);

        tokio::spawn(async move {
            tracing::debug!(sender = %sender, "Dispatch worker started");
            while let Some(message) = rx.recv().await {
                dispatcher.process(message).await;
            }
        });

        tx
    }

    /// Process one inbound message end to end
    async fn process(&self, message: InboundMessage) {
        let body = match message.kind {
            MessageKind::Text => match message.text_body() {
                Some(t) if !t.trim().is_empty() => t.to_string(),
                _ => return,
            },
            MessageKind::Audio => match self.transcribe_voice_note(&message).await {
                Ok(text) if !text.is_empty() => {
                    tracing::info!(sender = %message.from, chars = text.len(), "Voice note transcribed");
                    text
                },
                Ok(_) => {
                    self.reply_canned(&message).await;
                    return;
                },
                Err(e) => {
                    tracing::warn!(sender = %message.from, error = %e, "Voice note transcription failed");
                    self.reply_canned(&message).await;
                    return;
                },
            },
            MessageKind::Image | MessageKind::Video | MessageKind::Document => {
                self.reply_canned(&message).await;
                return;
            },
            MessageKind::Unsupported => {
                tracing::debug!(sender = %message.from, "Unsupported message type ignored");
                return;
            },
        };

        let inbound = InboundText {
            from: message.from.clone(),
            message_id: message.id.clone(),
            body,
        };

        let outcome = {
            // Only this sender's session is locked for the turn; the map
            // itself stays free for other senders and the status page
            let session = self.sessions.session(&inbound.from);
            let mut session = session.lock().await;
            self.engine.handle_text(&mut session, &inbound, Utc::now()).await
        };

        if let Some(reply) = outcome.reply {
            self.deliver(&inbound.from, &reply).await;
        }
        if let Some(alert) = outcome.handoff {
            self.notify_operator(&alert).await;
        }
    }

    /// Resolve, download and transcribe a voice note
    async fn transcribe_voice_note(
        &self,
        message: &InboundMessage,
    ) -> zap_agent_core::Result<String> {
        let media = message
            .audio_ref()
            .ok_or_else(|| zap_agent_core::Error::WhatsApp("audio message without media ref".to_string()))?;

        let location = self.whatsapp.media_location(&media.id).await?;
        let mime = location
            .mime_type
            .clone()
            .or_else(|| media.mime_type.clone())
            .unwrap_or_else(|| "audio/ogg".to_string());
        let bytes = self.whatsapp.download_media(&location).await?;

        let text = self.llm.transcribe(bytes, &mime).await?;
        Ok(text)
    }

    /// Canned reply for media the agent cannot read. Still deduped by
    /// message id so a webhook retry does not double-send.
    async fn reply_canned(&self, message: &InboundMessage) {
        let fresh = {
            let session = self.sessions.session(&message.from);
            let mut session = session.lock().await;
            session.note_inbound_id(&message.id)
        };
        if !fresh {
            return;
        }
        let reply = self.engine.non_text_reply().to_string();
        self.deliver(&message.from, &reply).await;
    }

    /// Typing simulation, then outbound send. Send failures are logged
    /// and swallowed; the turn is already committed to the session.
    async fn deliver(&self, to: &str, reply: &str) {
        let delay_ms = self.typing.delay_ms(reply.chars().count());
        if delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
        }

        if let Err(e) = self.whatsapp.send_text(to, reply).await {
            tracing::error!(to = %to, error = %e, "Failed to send reply");
        }
    }

    /// WhatsApp alert to the human operator plus the durable lead record
    async fn notify_operator(&self, alert: &HandoffAlert) {
        tracing::info!(sender = %alert.sender, stage = %alert.stage, "Hot lead hand-off");

        let note = format!(
            "🔥 LEAD QUENTE!\nNúmero: {}\nEstágio: {}\nMensagem: \"{}\"",
            alert.sender, alert.stage, alert.text,
        );
        if let Err(e) = self
            .whatsapp
            .send_text(self.whatsapp.operator_number(), &note)
            .await
        {
            tracing::error!(error = %e, "Failed to alert operator");
        }

        if let Err(e) = self.leads.append(alert).await {
            tracing::error!(error = %e, "Failed to append lead record");
        }
    }
}
