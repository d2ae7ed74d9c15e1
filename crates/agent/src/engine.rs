//! Agent engine: the reply-selection priority chain
//!
//! For every inbound text the engine normalizes, dedupes, runs the stage
//! machine, walks the canned-reply tiers and only then calls the model,
//! guarding its output. The decision itself is pure; the single side
//! effect is the injected `LlmBackend` call on the fallback tier.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use zap_agent_config::SalesConfig;
use zap_agent_core::{DetectedIntents, SalesStage, TurnRole};
use zap_agent_llm::{build_system_prompt, LlmBackend, Message};

use crate::guards::{GuardContext, GuardSet};
use crate::normalize::normalize;
use crate::rules::RuleSet;
use crate::session::Session;
use crate::stage::evaluate_transitions;

/// One inbound text event, after transport-level extraction
#[derive(Debug, Clone)]
pub struct InboundText {
    /// Sender phone number
    pub from: String,
    /// Provider message id
    pub message_id: String,
    /// Raw message body (or voice-note transcript)
    pub body: String,
}

/// Operator alert produced when a session first becomes sales-ready
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffAlert {
    pub sender: String,
    pub stage: SalesStage,
    /// Verbatim triggering text
    pub text: String,
}

/// Outcome of processing one inbound text
#[derive(Debug, Clone, Default)]
pub struct TurnOutcome {
    /// Reply to dispatch; `None` means stay silent
    pub reply: Option<String>,
    /// One-time hand-off alert, if this turn made the session sales-ready
    pub handoff: Option<HandoffAlert>,
}

/// Sales conversation engine
pub struct AgentEngine {
    sales: Arc<SalesConfig>,
    rules: RuleSet,
    guards: GuardSet,
    llm: Arc<dyn LlmBackend>,
}

impl AgentEngine {
    pub fn new(sales: Arc<SalesConfig>, llm: Arc<dyn LlmBackend>) -> Self {
        let objection_keys = sales.objection_answers.keys().cloned().collect();
        let rules = RuleSet::new(&sales.keywords, objection_keys);
        let guards = GuardSet::new(&sales);
        Self {
            sales,
            rules,
            guards,
            llm,
        }
    }

    /// Canned reply for image/video/document messages
    pub fn non_text_reply(&self) -> &str {
        &self.sales.non_text_reply
    }

    /// Process one inbound text message against its session.
    ///
    /// `now` is injected so the link cooldown is testable. The caller is
    /// responsible for per-sender serialization and for dispatching the
    /// returned reply.
    pub async fn handle_text(
        &self,
        session: &mut Session,
        inbound: &InboundText,
        now: DateTime<Utc>,
    ) -> TurnOutcome {
        // Exactly-once per provider message id
        if !session.note_inbound_id(&inbound.message_id) {
            tracing::debug!(
                sender = %inbound.from,
                message_id = %inbound.message_id,
                "Duplicate inbound id dropped"
            );
            return TurnOutcome::default();
        }

        let raw = inbound.body.as_str();
        let normalized = normalize(raw);
        let intents = self.rules.detect(&normalized);

        // Too short, or confused with no stronger intent alongside: ask the
        // clarifying question without touching stage or counters. A message
        // like "quanto custa?" fires confusion on the "?" but must still
        // reach the price tier.
        let only_confused = intents.confusion
            && !intents.price_question
            && !intents.checkout
            && !intents.objection
            && !intents.interest;
        if raw.chars().count() < self.sales.min_inbound_chars || only_confused {
            let reply = self.sales.clarify_reply.clone();
            session.push_exchange(raw, &reply, self.sales.history_max_turns);
            return TurnOutcome {
                reply: Some(reply),
                handoff: None,
            };
        }

        // A text-level repeat of the previous inbound is silently ignored,
        // unless it carries an actionable intent: a repeated "quero comprar"
        // after the link cooldown must still get the payment-method reply
        // (see DESIGN.md for the silence decision)
        let repeated = session.note_inbound_text(&normalized);
        let actionable = intents.price_question || intents.checkout || intents.objection;
        if repeated && !actionable {
            tracing::debug!(sender = %inbound.from, "Repeated message ignored");
            return TurnOutcome::default();
        }

        // Stage machine
        let update = evaluate_transitions(session.stage, session.history.len(), intents);
        if update.objection_detected {
            session.expensive_count += 1;
        }
        if update.stage != session.stage {
            tracing::info!(
                sender = %inbound.from,
                from = %session.stage,
                to = %update.stage,
                intents = ?intents.fired(),
                "Stage transition"
            );
        }
        session.stage = update.stage;

        let reply = self.decide_reply(session, raw, &normalized, intents, now).await;

        session.push_exchange(raw, &reply, self.sales.history_max_turns);

        let handoff = self.decide_handoff(session, inbound);

        TurnOutcome {
            reply: Some(reply),
            handoff,
        }
    }

    /// Walk the canned tiers, first match wins; the model is the last tier
    async fn decide_reply(
        &self,
        session: &mut Session,
        raw: &str,
        normalized: &str,
        intents: DetectedIntents,
        now: DateTime<Utc>,
    ) -> String {
        let sales = &self.sales;

        if intents.price_question {
            session.price_explained = true;
            return format!(
                "O valor é R$ {}, mas hoje sai por R$ {} 🙂\nFaz sentido pra você agora?",
                sales.price_full, sales.price_offer
            );
        }

        if intents.checkout {
            if session.can_send_link(now, sales.link_cooldown_seconds) {
                session.link_sent_at = Some(now);
                return format!(
                    "Aqui está o link da oferta de hoje:\n{}\nPrefere pagar à vista ou parcelado?",
                    sales.offer_link
                );
            }
            return "Prefere pagar à vista ou parcelado? 🙂".to_string();
        }

        if let Some(key) = self.rules.objection_key(normalized) {
            if let Some(answer) = sales.objection_answers.get(key) {
                return answer.clone();
            }
        }

        self.model_reply(session, raw, intents).await
    }

    async fn model_reply(
        &self,
        session: &Session,
        raw: &str,
        intents: DetectedIntents,
    ) -> String {
        let system = build_system_prompt(&self.sales, session.stage, session.expensive_count);

        let mut messages = Vec::with_capacity(self.sales.history_window + 2);
        messages.push(Message::system(system));
        for turn in session.recent_history(self.sales.history_window) {
            let msg = match turn.role {
                TurnRole::User => Message::user(&turn.content),
                TurnRole::Assistant => Message::assistant(&turn.content),
            };
            messages.push(msg);
        }
        messages.push(Message::user(raw));

        let generated = match self.llm.chat(&messages).await {
            Ok(text) => text,
            Err(e) => {
                // Never surfaced to the end user
                tracing::warn!(error = %e, model = %self.llm.model_name(), "Model call failed");
                None
            },
        };

        match generated {
            Some(text) => {
                let ctx = GuardContext {
                    checkout_intent: intents.checkout,
                    price_question: intents.price_question,
                    price_explained: session.price_explained,
                    expensive_count: session.expensive_count,
                };
                self.guards.apply(&text, ctx)
            },
            None => self.sales.fallback_reply.clone(),
        }
    }

    /// At most once per session, the first time the stage reaches Decision
    fn decide_handoff(&self, session: &mut Session, inbound: &InboundText) -> Option<HandoffAlert> {
        if session.human_notified || !session.stage.is_sales_ready() {
            return None;
        }
        session.human_notified = true;
        Some(HandoffAlert {
            sender: inbound.from.clone(),
            stage: session.stage,
            text: inbound.body.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStore;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use zap_agent_llm::LlmError;

    /// Scripted backend recording how often it was called
    struct MockLlm {
        reply: Option<String>,
        calls: Mutex<u32>,
        fail: bool,
    }

    impl MockLlm {
        fn with_reply(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Some(reply.to_string()),
                calls: Mutex::new(0),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: None,
                calls: Mutex::new(0),
                fail: true,
            })
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl LlmBackend for MockLlm {
        async fn chat(&self, _messages: &[Message]) -> Result<Option<String>, LlmError> {
            *self.calls.lock().unwrap() += 1;
            if self.fail {
                return Err(LlmError::Api("boom".to_string()));
            }
            Ok(self.reply.clone())
        }

        async fn transcribe(&self, _audio: Vec<u8>, _mime: &str) -> Result<String, LlmError> {
            Ok(String::new())
        }

        fn model_name(&self) -> &str {
            "mock"
        }
    }

    fn engine(llm: Arc<MockLlm>) -> AgentEngine {
        AgentEngine::new(Arc::new(SalesConfig::default()), llm)
    }

    fn inbound(body: &str, id: &str) -> InboundText {
        InboundText {
            from: "5511999990000".to_string(),
            message_id: id.to_string(),
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn test_short_message_gets_clarify_and_no_state_change() {
        let store = SessionStore::new();
        let eng = engine(MockLlm::with_reply("oi"));
        let session = store.session("u");
        let mut session = session.lock().await;

        let out = eng
            .handle_text(&mut session, &inbound("oi", "m1"), Utc::now())
            .await;
        assert_eq!(
            out.reply.as_deref(),
            Some(SalesConfig::default().clarify_reply.as_str())
        );
        assert_eq!(session.stage, SalesStage::ColdOpen);
        assert_eq!(session.expensive_count, 0);
    }

    #[tokio::test]
    async fn test_pure_confusion_gets_clarify() {
        let store = SessionStore::new();
        let llm = MockLlm::with_reply("ignorado");
        let eng = engine(llm.clone());
        let session = store.session("u");
        let mut session = session.lock().await;

        let out = eng
            .handle_text(&mut session, &inbound("como assim", "m1"), Utc::now())
            .await;
        assert_eq!(out.reply.unwrap(), SalesConfig::default().clarify_reply);
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_message_id_is_dropped() {
        let store = SessionStore::new();
        let eng = engine(MockLlm::with_reply("resposta"));
        let session = store.session("u");
        let mut session = session.lock().await;

        let first = eng
            .handle_text(&mut session, &inbound("quanto custa?", "m1"), Utc::now())
            .await;
        assert!(first.reply.is_some());
        let turns_after_first = session.history.len();

        let second = eng
            .handle_text(&mut session, &inbound("quanto custa?", "m1"), Utc::now())
            .await;
        assert!(second.reply.is_none());
        assert_eq!(session.history.len(), turns_after_first);
    }

    #[tokio::test]
    async fn test_repeated_text_is_silently_ignored() {
        let store = SessionStore::new();
        let eng = engine(MockLlm::with_reply("resposta"));
        let session = store.session("u");
        let mut session = session.lock().await;

        let first = eng
            .handle_text(
                &mut session,
                &inbound("me conta mais sobre o metodo", "m1"),
                Utc::now(),
            )
            .await;
        assert!(first.reply.is_some());

        let second = eng
            .handle_text(
                &mut session,
                &inbound("me conta mais sobre o metodo", "m2"),
                Utc::now(),
            )
            .await;
        assert!(second.reply.is_none());
    }

    #[tokio::test]
    async fn test_price_question_reply_and_flags() {
        let store = SessionStore::new();
        let llm = MockLlm::with_reply("ignorado");
        let eng = engine(llm.clone());
        let session = store.session("u");
        let mut session = session.lock().await;

        let out = eng
            .handle_text(&mut session, &inbound("quanto custa?", "m1"), Utc::now())
            .await;

        let reply = out.reply.unwrap();
        assert!(reply.contains("R$ 299"));
        assert!(reply.contains("R$ 195"));
        assert!(!reply.contains("125"));
        assert!(session.price_explained);
        assert_eq!(session.stage, SalesStage::Decision);
        // Canned tier: no model call
        assert_eq!(llm.calls(), 0);
        // Sales-ready: hand-off fired
        assert!(out.handoff.is_some());
        assert!(session.human_notified);
    }

    #[tokio::test]
    async fn test_checkout_sends_link_once_per_cooldown() {
        let store = SessionStore::new();
        let eng = engine(MockLlm::with_reply("ignorado"));
        let session = store.session("u");
        let mut session = session.lock().await;
        let link = SalesConfig::default().offer_link;
        let t0 = Utc::now();

        let first = eng
            .handle_text(&mut session, &inbound("quero comprar", "m1"), t0)
            .await;
        assert!(first.reply.unwrap().contains(&link));

        // Within the cooldown: no second link
        let t1 = t0 + chrono::Duration::seconds(30);
        let second = eng
            .handle_text(&mut session, &inbound("manda o link", "m2"), t1)
            .await;
        assert!(!second.reply.unwrap().contains(&link));

        // Cooldown expired: link again
        let t2 = t0 + chrono::Duration::seconds(121);
        let third = eng
            .handle_text(&mut session, &inbound("link de pagamento", "m3"), t2)
            .await;
        assert!(third.reply.unwrap().contains(&link));
    }

    #[tokio::test]
    async fn test_repeated_checkout_gets_payment_question_not_silence() {
        let store = SessionStore::new();
        let eng = engine(MockLlm::with_reply("ignorado"));
        let session = store.session("u");
        let mut session = session.lock().await;
        let link = SalesConfig::default().offer_link;
        let t0 = Utc::now();

        let first = eng
            .handle_text(&mut session, &inbound("quero comprar", "m1"), t0)
            .await;
        assert!(first.reply.unwrap().contains(&link));

        // Same text 30s later with a fresh id: still answered, no link
        let t1 = t0 + chrono::Duration::seconds(30);
        let second = eng
            .handle_text(&mut session, &inbound("quero comprar", "m2"), t1)
            .await;
        let reply = second.reply.expect("repeated checkout still gets a reply");
        assert!(!reply.contains(&link));
        assert!(reply.contains("vista ou parcelado"));
    }

    #[tokio::test]
    async fn test_handoff_fires_at_most_once() {
        let store = SessionStore::new();
        let eng = engine(MockLlm::with_reply("resposta"));
        let session = store.session("u");
        let mut session = session.lock().await;

        let first = eng
            .handle_text(&mut session, &inbound("quanto custa?", "m1"), Utc::now())
            .await;
        assert!(first.handoff.is_some());

        let second = eng
            .handle_text(&mut session, &inbound("quero comprar", "m2"), Utc::now())
            .await;
        assert!(second.handoff.is_none());
    }

    #[tokio::test]
    async fn test_objection_answer_tier() {
        let store = SessionStore::new();
        let llm = MockLlm::with_reply("ignorado");
        let eng = engine(llm.clone());
        let session = store.session("u");
        let mut session = session.lock().await;

        let out = eng
            .handle_text(&mut session, &inbound("tem garantia?", "m1"), Utc::now())
            .await;
        let expected = SalesConfig::default().objection_answers["garantia"].clone();
        assert_eq!(out.reply.unwrap(), expected);
        assert_eq!(llm.calls(), 0);
        // "garantia" is also an interest keyword
        assert_eq!(session.stage, SalesStage::ValueBuilding);
    }

    #[tokio::test]
    async fn test_objection_increments_counter() {
        let store = SessionStore::new();
        let eng = engine(MockLlm::with_reply("entendo voce"));
        let session = store.session("u");
        let mut session = session.lock().await;

        eng.handle_text(&mut session, &inbound("achei muito caro", "m1"), Utc::now())
            .await;
        assert_eq!(session.expensive_count, 1);
        assert_eq!(session.stage, SalesStage::ObjectionHandling);

        eng.handle_text(&mut session, &inbound("continua caro pra mim", "m2"), Utc::now())
            .await;
        assert_eq!(session.expensive_count, 2);
    }

    #[tokio::test]
    async fn test_model_fallback_with_guards() {
        let store = SessionStore::new();
        let llm = MockLlm::with_reply("da uma olhada https://spam.example e custa R$ 50");
        let eng = engine(llm.clone());
        let session = store.session("u");
        let mut session = session.lock().await;

        let out = eng
            .handle_text(&mut session, &inbound("me fala do metodo", "m1"), Utc::now())
            .await;
        let reply = out.reply.unwrap();
        assert_eq!(llm.calls(), 1);
        assert!(reply.contains("[link]"));
        assert!(!reply.contains("R$ 50"));
    }

    #[tokio::test]
    async fn test_model_failure_uses_canned_fallback() {
        let store = SessionStore::new();
        let eng = engine(MockLlm::failing());
        let session = store.session("u");
        let mut session = session.lock().await;

        let out = eng
            .handle_text(&mut session, &inbound("me fala do metodo", "m1"), Utc::now())
            .await;
        assert_eq!(out.reply.unwrap(), SalesConfig::default().fallback_reply);
    }
}
