//! Webhook server
//!
//! Thin transport layer over the agent engine: the Cloud API verification
//! handshake, the inbound webhook (acknowledged immediately, processed in
//! the background) and per-sender dispatch workers that serialize turns,
//! simulate typing and deliver replies.

pub mod dispatch;
pub mod http;
pub mod leads;
pub mod state;

pub use dispatch::Dispatcher;
pub use http::create_router;
pub use leads::LeadLog;
pub use state::AppState;
