//! Shared application state

use std::sync::Arc;

use zap_agent_agent::SessionStore;
use zap_agent_config::Settings;

use crate::dispatch::Dispatcher;

/// State handed to every HTTP handler
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub sessions: Arc<SessionStore>,
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(
        settings: Arc<Settings>,
        sessions: Arc<SessionStore>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            settings,
            sessions,
            dispatcher,
        }
    }
}
