//! Semantic and intent keyword rows.
//!
//! Read-only lookup tables driving the rule-based resolver.

use serde::{Deserialize, Serialize};

/// Topic keyword (e.g. "공부", "식사") with comma-separated synonyms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SemanticKeyword {
    pub id: i64,
    pub keyword: String,
    pub alias: String,
    pub category: String,
}

impl SemanticKeyword {
    /// Synonym aliases in stored order, trimmed, empty entries dropped.
    pub fn aliases(&self) -> Vec<&str> {
        self.alias
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .collect()
    }
}

/// Intent phrase row; the raw intent_type string is parsed into
/// [`IntentType`] for dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct IntentKeyword {
    pub id: i64,
    pub phrase: String,
    pub intent_type: String,
}

impl IntentKeyword {
    /// Comma-split trigger phrases in stored order.
    pub fn phrases(&self) -> Vec<&str> {
        self.phrase
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    }

    pub fn intent(&self) -> IntentType {
        IntentType::parse(&self.intent_type)
    }
}

/// What the user wants done. Parsed from the stored intent_type tag so
/// branching happens on the enum rather than raw strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentType {
    /// "추천 요청" – pick something for me.
    RecommendRequest,
    /// "공간 요청" – I need a kind of space.
    SpaceRequest,
    /// "위치 요청" – where is it.
    LocateRequest,
    /// Any other tag from the table, carried verbatim.
    Other(String),
}

impl IntentType {
    pub fn parse(tag: &str) -> Self {
        match tag.trim() {
            "추천 요청" => IntentType::RecommendRequest,
            "공간 요청" => IntentType::SpaceRequest,
            "위치 요청" => IntentType::LocateRequest,
            other => IntentType::Other(other.to_string()),
        }
    }

    /// Display tag for prompt rendering; inverse of [`IntentType::parse`].
    pub fn as_tag(&self) -> &str {
        match self {
            IntentType::RecommendRequest => "추천 요청",
            IntentType::SpaceRequest => "공간 요청",
            IntentType::LocateRequest => "위치 요청",
            IntentType::Other(tag) => tag,
        }
    }

    /// True for the intents that trigger the paginated recommend branch.
    pub fn wants_recommendation(&self) -> bool {
        matches!(
            self,
            IntentType::RecommendRequest | IntentType::SpaceRequest
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_type_parse_and_tag() {
        assert_eq!(IntentType::parse("추천 요청"), IntentType::RecommendRequest);
        assert_eq!(IntentType::parse(" 공간 요청 "), IntentType::SpaceRequest);
        assert_eq!(
            IntentType::parse("길안내"),
            IntentType::Other("길안내".to_string())
        );
        assert_eq!(IntentType::RecommendRequest.as_tag(), "추천 요청");
    }

    #[test]
    fn recommend_and_space_paginate() {
        assert!(IntentType::RecommendRequest.wants_recommendation());
        assert!(IntentType::SpaceRequest.wants_recommendation());
        assert!(!IntentType::LocateRequest.wants_recommendation());
    }
}
