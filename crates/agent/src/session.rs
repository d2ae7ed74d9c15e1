//! Session state and store
//!
//! One `Session` per sender phone number, created lazily on first contact
//! and kept for the process lifetime (no TTL, no persistence). The store
//! hands out `Arc<Mutex<Session>>` handles: a turn locks only its own
//! session while it awaits the model, never the map itself, so other
//! senders and the status page stay unblocked. The store is an explicit
//! object owned by the server state and injected into the handler so it
//! can be swapped for a durable backend without touching the business
//! logic.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashSet, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;

use zap_agent_core::{SalesStage, Turn};

/// Recent inbound ids remembered per session for webhook-retry absorption
const DEDUPE_CAPACITY: usize = 64;

/// Conversation state for one sender
#[derive(Debug)]
pub struct Session {
    /// Ordered (user, assistant) turns; bounded by `cap_history`
    pub history: Vec<Turn>,
    /// Sales-funnel stage, monotonically non-decreasing
    pub stage: SalesStage,
    /// True once the fixed price message was sent
    pub price_explained: bool,
    /// Count of detected price objections
    pub expensive_count: u32,
    /// When the payment link was last sent
    pub link_sent_at: Option<DateTime<Utc>>,
    /// True once the operator hand-off alert fired
    pub human_notified: bool,
    /// Hash of the previous normalized inbound text (repeat detection)
    pub last_inbound_hash: Option<u64>,
    recent_ids: VecDeque<String>,
    recent_id_set: HashSet<String>,
}

impl Session {
    fn new() -> Self {
        Self {
            history: Vec::new(),
            stage: SalesStage::ColdOpen,
            price_explained: false,
            expensive_count: 0,
            link_sent_at: None,
            human_notified: false,
            last_inbound_hash: None,
            recent_ids: VecDeque::new(),
            recent_id_set: HashSet::new(),
        }
    }

    /// Record an inbound message id. Returns `false` when the id was seen
    /// before (provider retry) and the event must be dropped.
    pub fn note_inbound_id(&mut self, message_id: &str) -> bool {
        if message_id.is_empty() {
            return true;
        }
        if self.recent_id_set.contains(message_id) {
            return false;
        }
        if self.recent_ids.len() == DEDUPE_CAPACITY {
            if let Some(evicted) = self.recent_ids.pop_front() {
                self.recent_id_set.remove(&evicted);
            }
        }
        self.recent_ids.push_back(message_id.to_string());
        self.recent_id_set.insert(message_id.to_string());
        true
    }

    /// Check the normalized text against the previous inbound and update
    /// the marker. Returns `true` when it is an exact repeat.
    pub fn note_inbound_text(&mut self, normalized: &str) -> bool {
        let mut hasher = DefaultHasher::new();
        normalized.hash(&mut hasher);
        let hash = hasher.finish();
        let repeat = self.last_inbound_hash == Some(hash);
        self.last_inbound_hash = Some(hash);
        repeat
    }

    /// Whether the payment link may be sent now
    pub fn can_send_link(&self, now: DateTime<Utc>, cooldown_seconds: u64) -> bool {
        match self.link_sent_at {
            None => true,
            Some(sent) => (now - sent).num_seconds() >= cooldown_seconds as i64,
        }
    }

    /// Append a (user, assistant) turn pair and enforce the history cap
    pub fn push_exchange(&mut self, user: &str, assistant: &str, cap: usize) {
        self.history.push(Turn::user(user));
        self.history.push(Turn::assistant(assistant));
        if self.history.len() > cap {
            let excess = self.history.len() - cap;
            self.history.drain(..excess);
        }
    }

    /// Last `window` turns for model context
    pub fn recent_history(&self, window: usize) -> &[Turn] {
        let start = self.history.len().saturating_sub(window);
        &self.history[start..]
    }
}

/// Process-lifetime map from sender id to session handle
#[derive(Default)]
pub struct SessionStore {
    inner: DashMap<String, Arc<Mutex<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or lazily create the session handle for a sender.
    ///
    /// The map shard guard is released before this returns; callers lock
    /// the returned handle for the duration of one turn. A turn in flight
    /// therefore never blocks map access for other senders.
    pub fn session(&self, sender: &str) -> Arc<Mutex<Session>> {
        self.inner
            .entry(sender.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Session::new())))
            .clone()
    }

    /// Number of live sessions
    pub fn count(&self) -> usize {
        self.inner.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_inbound_id_dedupe() {
        let mut session = Session::new();
        assert!(session.note_inbound_id("wamid.1"));
        assert!(!session.note_inbound_id("wamid.1"));
        assert!(session.note_inbound_id("wamid.2"));
    }

    #[test]
    fn test_inbound_id_dedupe_is_bounded() {
        let mut session = Session::new();
        for i in 0..DEDUPE_CAPACITY + 10 {
            assert!(session.note_inbound_id(&format!("wamid.{}", i)));
        }
        assert_eq!(session.recent_ids.len(), DEDUPE_CAPACITY);
        // The oldest ids were evicted and are accepted again
        assert!(session.note_inbound_id("wamid.0"));
    }

    #[test]
    fn test_repeat_detection() {
        let mut session = Session::new();
        assert!(!session.note_inbound_text("quanto custa"));
        assert!(session.note_inbound_text("quanto custa"));
        assert!(!session.note_inbound_text("quero comprar"));
    }

    #[test]
    fn test_link_cooldown() {
        let mut session = Session::new();
        let now = Utc::now();
        assert!(session.can_send_link(now, 120));

        session.link_sent_at = Some(now);
        assert!(!session.can_send_link(now + Duration::seconds(30), 120));
        assert!(session.can_send_link(now + Duration::seconds(120), 120));
    }

    #[test]
    fn test_history_cap() {
        let mut session = Session::new();
        for i in 0..40 {
            session.push_exchange(&format!("u{}", i), &format!("a{}", i), 50);
        }
        assert_eq!(session.history.len(), 50);
        // Oldest turns were dropped
        assert_eq!(session.history[0].content, "u15");
        assert_eq!(session.recent_history(4).len(), 4);
    }

    #[tokio::test]
    async fn test_store_lazy_creation() {
        let store = SessionStore::new();
        assert_eq!(store.count(), 0);

        store.session("5511999990000").lock().await.expensive_count += 1;
        assert_eq!(store.count(), 1);
        assert_eq!(
            store.session("5511999990000").lock().await.expensive_count,
            1
        );
    }

    #[tokio::test]
    async fn test_store_not_blocked_by_in_flight_turn() {
        use std::time::Duration;

        let store = SessionStore::new();
        let busy = store.session("5511911110000");
        // Simulates a turn parked on a slow model call
        let _turn = busy.lock().await;

        // Map-wide access and other senders proceed regardless
        assert_eq!(store.count(), 1);
        let other = store.session("5511922220000");
        let locked = tokio::time::timeout(Duration::from_millis(100), other.lock()).await;
        assert!(locked.is_ok());
    }
}
