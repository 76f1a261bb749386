//! Core request/reply types shared across the workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a persisted conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Storage representation ("user" / "assistant").
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Document-id prefix for this role (Q for questions, A for answers).
    pub fn doc_prefix(&self) -> &'static str {
        match self {
            Role::User => "Q",
            Role::Assistant => "A",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

/// How confidently a building was identified from the user text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStrength {
    /// Canonical name or a building-level alias appeared in the text.
    Direct,
    /// Only an internal-facility alias appeared; the building is
    /// returned but must not be treated as a confirmed building match.
    FacilityAlias,
    /// Inherited from a previous turn (floor-only follow-up).
    Context,
}

impl MatchStrength {
    pub fn is_direct(&self) -> bool {
        matches!(self, MatchStrength::Direct)
    }
}

/// One incoming chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub id_token: String,
    pub message: String,
    /// Session slot the client is currently in (0-based).
    pub current_session_idx: i64,
}

/// Reply for one chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub message: String,
    pub session_title: String,
}

/// One paired question/answer for session replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

/// A past session: display name, paired logs, and creation time
/// (earliest turn timestamp).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_name: String,
    pub logs: Vec<QaPair>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Result of a session deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub message: String,
    /// Smallest deleted session number; later sessions were shifted down
    /// starting from here. None if the delete removed no numbered turns.
    pub renumbered_from: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_roundtrip_and_prefix() {
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!(Role::Assistant.doc_prefix(), "A");
        assert_eq!(Role::from_str("assistant"), Some(Role::Assistant));
        assert_eq!(Role::from_str("system"), None);
    }
}
