//! Conversation turn record and the pagination checkpoint it carries.
//!
//! Maps to the `turns` table. One row per role per message; assistant
//! rows embed a [`Checkpoint`] so a later follow-up can resume the
//! facility list where the previous answer stopped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use cbot_core::Role;

/// Pagination state carried by an assistant turn: a serialized
/// continuation token for the follow-up state machine.
///
/// Invariant: `answered` and `remaining` are disjoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Resolved semantic keyword, empty when none matched.
    pub semantic_keyword: String,
    /// Facility ids already shown to the user, in answer order.
    pub answered: Vec<i64>,
    /// Facility ids computed but not yet shown, in relation order.
    pub remaining: Vec<i64>,
    /// Matched building, None when no building was in play.
    pub matched_building_id: Option<i64>,
    /// Floor token mentioned by the user, empty when absent.
    pub floor_token: String,
}

impl Checkpoint {
    pub fn has_remaining(&self) -> bool {
        !self.remaining.is_empty()
    }
}

/// One persisted turn. Immutable once written, except during session
/// renumbering after a delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TurnRecord {
    pub user_uid: String,
    /// Generated id: `Q%05d` for user turns, `A%05d` for assistant turns;
    /// the sequence is per-user per-prefix, not globally unique.
    pub doc_id: String,
    /// `<session_title>_<session_number:03>`.
    pub session_id: String,
    pub session_number: i64,
    /// Count of user turns already in the session when this pair was written.
    pub log_index: i64,
    pub role: String,
    pub message: String,
    pub session_title: String,
    pub timestamp: DateTime<Utc>,
    /// JSON array of facility ids (assistant turns; `[]` otherwise).
    pub answered_facilities: String,
    /// JSON array of facility ids (assistant turns; `[]` otherwise).
    pub remaining_facilities: String,
    pub semantic_keyword: String,
    pub matched_building_id: Option<i64>,
    pub floor_token: String,
}

impl TurnRecord {
    /// Builds a user-role turn with an empty checkpoint.
    pub fn user(
        user_uid: &str,
        doc_id: String,
        session_id: &str,
        session_number: i64,
        log_index: i64,
        message: &str,
        session_title: &str,
    ) -> Self {
        Self {
            user_uid: user_uid.to_string(),
            doc_id,
            session_id: session_id.to_string(),
            session_number,
            log_index,
            role: Role::User.as_str().to_string(),
            message: message.to_string(),
            session_title: session_title.to_string(),
            timestamp: Utc::now(),
            answered_facilities: "[]".to_string(),
            remaining_facilities: "[]".to_string(),
            semantic_keyword: String::new(),
            matched_building_id: None,
            floor_token: String::new(),
        }
    }

    /// Builds an assistant-role turn carrying the given checkpoint.
    pub fn assistant(
        user_uid: &str,
        doc_id: String,
        session_id: &str,
        session_number: i64,
        log_index: i64,
        message: &str,
        session_title: &str,
        checkpoint: &Checkpoint,
    ) -> Result<Self, StorageError> {
        Ok(Self {
            user_uid: user_uid.to_string(),
            doc_id,
            session_id: session_id.to_string(),
            session_number,
            log_index,
            role: Role::Assistant.as_str().to_string(),
            message: message.to_string(),
            session_title: session_title.to_string(),
            timestamp: Utc::now(),
            answered_facilities: serde_json::to_string(&checkpoint.answered)?,
            remaining_facilities: serde_json::to_string(&checkpoint.remaining)?,
            semantic_keyword: checkpoint.semantic_keyword.clone(),
            matched_building_id: checkpoint.matched_building_id,
            floor_token: checkpoint.floor_token.clone(),
        })
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant.as_str()
    }

    /// Deserializes the pagination checkpoint embedded in this row.
    pub fn checkpoint(&self) -> Result<Checkpoint, StorageError> {
        Ok(Checkpoint {
            semantic_keyword: self.semantic_keyword.clone(),
            answered: serde_json::from_str(&self.answered_facilities)?,
            remaining: serde_json::from_str(&self.remaining_facilities)?,
            matched_building_id: self.matched_building_id,
            floor_token: self.floor_token.clone(),
        })
    }
}
