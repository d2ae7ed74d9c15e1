//! Core types for the WhatsApp sales agent
//!
//! This crate provides foundational types used across all other crates:
//! - Conversation turns and roles
//! - Sales funnel stages
//! - Detected intent types
//! - Error types

pub mod conversation;
pub mod error;
pub mod intent;

pub use conversation::{SalesStage, Turn, TurnRole};
pub use error::{Error, Result};
pub use intent::{DetectedIntents, Intent};
