//! Sales conversation engine
//!
//! The deduplicated core of the WhatsApp sales agent:
//! - Message normalizer (lowercase, diacritics stripped, trimmed)
//! - Declarative keyword rule table feeding five intent classifiers
//! - Stage/guard state machine (monotone sales-funnel ratchet)
//! - Reply-selection priority chain (canned tiers before the model)
//! - Pure post-processing guards over model output
//! - One-time human hand-off decision
//!
//! The engine is deterministic apart from the injected `LlmBackend`; the
//! current time is passed in explicitly so cooldown logic is testable.

pub mod engine;
pub mod guards;
pub mod normalize;
pub mod rules;
pub mod session;
pub mod stage;

pub use engine::{AgentEngine, HandoffAlert, InboundText, TurnOutcome};
pub use guards::{GuardContext, GuardSet};
pub use normalize::{contains_any, normalize};
pub use rules::RuleSet;
pub use session::{Session, SessionStore};
pub use stage::evaluate_transitions;
