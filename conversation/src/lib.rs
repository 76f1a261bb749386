//! # Conversation
//!
//! The conversational matching-and-state-continuation engine: rule-based
//! keyword resolution, follow-up detection and pagination, facility
//! retrieval, and the per-message controller state machine that ties the
//! catalog, the turn log, the prompt composer, and the completion model
//! together.
//!
//! ## Modules
//!
//! - [`matcher`] – building / semantic / intent / floor resolution
//! - [`followup`] – continuation-request detection
//! - [`retriever`] – candidate facility computation and pagination
//! - [`reply`] – completion-model reply parsing
//! - [`auth`] – identity verification seam
//! - [`controller`] – ConversationController

pub mod auth;
pub mod controller;
pub mod followup;
pub mod matcher;
pub mod reply;
pub mod retriever;

pub use auth::{IdentityVerifier, StaticTokenVerifier};
pub use controller::ConversationController;
pub use matcher::{KeywordResolver, MatcherConfig};
