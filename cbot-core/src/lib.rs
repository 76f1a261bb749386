//! # cbot-core
//!
//! Core types and error taxonomy for the campus chat bot: chat request/reply
//! types, session summaries, [`ChatError`], and tracing initialization.
//! Transport-agnostic; used by storage, conversation, and cbot-cli.

pub mod error;
pub mod logger;
pub mod types;

pub use error::{ChatError, Result};
pub use logger::init_tracing;
pub use types::{
    ChatReply, ChatRequest, DeleteOutcome, MatchStrength, QaPair, Role, SessionSummary,
};
