//! HTTP endpoints
//!
//! Three routes: a status page, the Cloud API verification handshake and
//! the inbound webhook. The webhook is acknowledged with 200 before any
//! processing happens; Meta retries on anything else and slow handlers
//! get the subscription throttled.

use std::collections::HashMap;

use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use zap_agent_whatsapp::WebhookEnvelope;

use crate::state::AppState;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/webhook", get(verify_webhook))
        .route("/webhook", post(receive_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Service status page
async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "zap-agent",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.settings.environment,
        "sessions": state.sessions.count(),
    }))
}

/// Subscription verification handshake.
///
/// Meta sends `hub.mode=subscribe`, the shared verify token and a
/// challenge; the challenge must be echoed back verbatim. The dotted
/// parameter names rule out a typed Query extractor here.
async fn verify_webhook(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<String, StatusCode> {
    let mode = params.get("hub.mode").map(String::as_str);
    let token = params.get("hub.verify_token").map(String::as_str);

    if mode == Some("subscribe") && token == Some(state.settings.whatsapp.verify_token.as_str()) {
        tracing::info!("Webhook subscription verified");
        return params
            .get("hub.challenge")
            .cloned()
            .ok_or(StatusCode::FORBIDDEN);
    }

    tracing::warn!(?mode, "Webhook verification rejected");
    Err(StatusCode::FORBIDDEN)
}

/// Inbound webhook: acknowledge, extract, enqueue
async fn receive_webhook(
    State(state): State<AppState>,
    Json(envelope): Json<WebhookEnvelope>,
) -> StatusCode {
    if let Some(message) = envelope.into_message() {
        tracing::debug!(
            sender = %message.from,
            message_id = %message.id,
            kind = ?message.kind,
            "Inbound message enqueued"
        );
        state.dispatcher.enqueue(message);
    }
    StatusCode::OK
}
