//! Rule-based keyword resolution over the catalog tables.
//!
//! All matching is substring containment against table rows in
//! insertion order; the first hit wins and there is no ranking across
//! rows. Given identical tables and text the result is fully
//! reproducible.

use std::sync::LazyLock;

use regex::Regex;

use cbot_core::MatchStrength;
use storage::{Building, IntentKeyword, SemanticKeyword};

/// Floor tokens recognized in user text and descriptions: B1층 or 1층..5층.
static FLOOR_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(B1층|[1-5]층)").unwrap());

/// Compound-noun trigger for the convenience-store priority rule.
const CONVENIENCE_TRIGGER: &str = "편의점";
/// Words that pull a convenience-store mention toward the meal keyword.
const MEAL_WORDS: [&str; 5] = ["밥", "먹", "식사", "점심", "저녁"];
const MEAL_KEYWORD: &str = "식사";
const CONVENIENCE_KEYWORD: &str = "편의";

/// Matcher tunables.
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// First alias index that denotes an internal facility rather than
    /// the building itself. Tied to catalog data-entry order; flagged to
    /// product owners as fragile, hence configurable.
    pub alias_threshold: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self { alias_threshold: 3 }
    }
}

/// Resolves buildings, semantic keywords, and intents from raw user text.
#[derive(Debug, Clone, Default)]
pub struct KeywordResolver {
    config: MatcherConfig,
}

impl KeywordResolver {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    /// First building whose canonical name or alias appears in `text`.
    ///
    /// Canonical name and aliases below the threshold give a Direct
    /// match; an alias at or above the threshold names a facility inside
    /// the building, so the building is returned with FacilityAlias
    /// strength and callers must not treat it as confirmed.
    pub fn match_building<'a>(
        &self,
        text: &str,
        buildings: &'a [Building],
    ) -> Option<(&'a Building, MatchStrength)> {
        for building in buildings {
            if !building.name.is_empty() && text.contains(&building.name) {
                return Some((building, MatchStrength::Direct));
            }
            for (idx, alias) in building.aliases().iter().enumerate() {
                if contains_token(text, alias) {
                    let strength = if idx < self.config.alias_threshold {
                        MatchStrength::Direct
                    } else {
                        MatchStrength::FacilityAlias
                    };
                    return Some((building, strength));
                }
            }
        }
        None
    }

    /// First semantic keyword whose keyword or alias appears in `text`.
    ///
    /// Priority rule: a convenience-store mention short-circuits the
    /// table scan and resolves to the meal keyword when a meal word also
    /// appears, otherwise to the convenience keyword.
    pub fn match_semantic<'a>(
        &self,
        text: &str,
        rows: &'a [SemanticKeyword],
    ) -> Option<&'a SemanticKeyword> {
        if text.contains(CONVENIENCE_TRIGGER) {
            let target = if MEAL_WORDS.iter().any(|w| text.contains(w)) {
                MEAL_KEYWORD
            } else {
                CONVENIENCE_KEYWORD
            };
            return rows.iter().find(|r| r.keyword == target);
        }

        rows.iter().find(|row| {
            contains_token(text, &row.keyword)
                || row.aliases().iter().any(|alias| contains_token(text, alias))
        })
    }

    /// First intent row with a comma-split phrase appearing in `text`.
    pub fn match_intent<'a>(
        &self,
        text: &str,
        rows: &'a [IntentKeyword],
    ) -> Option<&'a IntentKeyword> {
        rows.iter()
            .find(|row| row.phrases().iter().any(|phrase| text.contains(phrase)))
    }
}

/// Substring containment; only the literal "atm" compares
/// case-insensitively (catalog rows carry it in varying case).
fn contains_token(text: &str, token: &str) -> bool {
    if token.is_empty() {
        return false;
    }
    if token.eq_ignore_ascii_case("atm") {
        text.to_ascii_lowercase().contains("atm")
    } else {
        text.contains(token)
    }
}

/// First floor token in the text, if any.
pub fn extract_floor_token(text: &str) -> Option<String> {
    FLOOR_TOKEN.find(text).map(|m| m.as_str().to_string())
}

/// Every floor token in a description, in order of appearance.
pub fn extract_floors(text: &str) -> Vec<String> {
    FLOOR_TOKEN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn building(id: i64, name: &str, alias: &str) -> Building {
        Building {
            id,
            name: name.to_string(),
            alias: alias.to_string(),
            description: String::new(),
        }
    }

    fn semantic(id: i64, keyword: &str, alias: &str) -> SemanticKeyword {
        SemanticKeyword {
            id,
            keyword: keyword.to_string(),
            alias: alias.to_string(),
            category: String::new(),
        }
    }

    #[test]
    fn canonical_name_beats_alias() {
        let resolver = KeywordResolver::default();
        let buildings = vec![
            building(1, "제1공학관", "G관, 공학관"),
            building(2, "학생회관", "S관"),
        ];
        let (b, strength) = resolver
            .match_building("제1공학관 어디야?", &buildings)
            .unwrap();
        assert_eq!(b.id, 1);
        assert!(strength.is_direct());
    }

    #[test]
    fn alias_at_or_past_threshold_is_facility_alias() {
        let resolver = KeywordResolver::default();
        let buildings = vec![building(
            1,
            "학생회관",
            "S관, 회관, 학관, 학생식당, 보건소",
        )];

        let (_, strength) = resolver.match_building("학관 가는 길", &buildings).unwrap();
        assert!(strength.is_direct()); // index 2

        let (b, strength) = resolver
            .match_building("학생식당 어디야", &buildings)
            .unwrap();
        assert_eq!(b.id, 1);
        assert_eq!(strength, MatchStrength::FacilityAlias); // index 3
    }

    #[test]
    fn alias_threshold_is_configurable() {
        let resolver = KeywordResolver::new(MatcherConfig { alias_threshold: 1 });
        let buildings = vec![building(1, "학생회관", "S관, 회관")];
        let (_, strength) = resolver.match_building("회관 어디야", &buildings).unwrap();
        assert_eq!(strength, MatchStrength::FacilityAlias);
    }

    #[test]
    fn first_building_in_table_order_wins() {
        let resolver = KeywordResolver::default();
        let buildings = vec![building(1, "공학관", "G관"), building(2, "공학관별관", "G별관")];
        let (b, _) = resolver.match_building("공학관별관 어디야", &buildings).unwrap();
        // "공학관" is a substring of the text, and row 1 comes first.
        assert_eq!(b.id, 1);
    }

    #[test]
    fn no_match_returns_none() {
        let resolver = KeywordResolver::default();
        let buildings = vec![building(1, "공학관", "G관")];
        assert!(resolver.match_building("도서관 어디야", &buildings).is_none());
    }

    #[test]
    fn semantic_matches_keyword_or_alias_in_table_order() {
        let resolver = KeywordResolver::default();
        let rows = vec![
            semantic(1, "공부", "시험, 과제"),
            semantic(2, "휴식", "쉬다, 쉴"),
        ];
        assert_eq!(resolver.match_semantic("시험 기간인데", &rows).unwrap().keyword, "공부");
        assert_eq!(resolver.match_semantic("쉴 곳 있어?", &rows).unwrap().keyword, "휴식");
        assert!(resolver.match_semantic("아무말", &rows).is_none());
    }

    #[test]
    fn convenience_store_rule_takes_precedence() {
        let resolver = KeywordResolver::default();
        let rows = vec![
            semantic(1, "편의", "편의점, ATM"),
            semantic(2, "식사", "밥, 먹을"),
        ];
        // Without a meal word the convenience keyword wins even though
        // the meal row would also match a generic scan.
        assert_eq!(
            resolver.match_semantic("편의점 어디 있어", &rows).unwrap().keyword,
            "편의"
        );
        assert_eq!(
            resolver.match_semantic("편의점에서 밥 먹을래", &rows).unwrap().keyword,
            "식사"
        );
    }

    #[test]
    fn atm_alias_is_case_insensitive() {
        let resolver = KeywordResolver::default();
        let rows = vec![semantic(1, "편의", "ATM, 인출기")];
        assert_eq!(resolver.match_semantic("atm 있어?", &rows).unwrap().keyword, "편의");
        assert_eq!(resolver.match_semantic("ATM 있어?", &rows).unwrap().keyword, "편의");
    }

    #[test]
    fn intent_matches_any_phrase() {
        let resolver = KeywordResolver::default();
        let rows = vec![IntentKeyword {
            id: 1,
            phrase: "추천해줘, 어디가 좋아".to_string(),
            intent_type: "추천 요청".to_string(),
        }];
        assert!(resolver.match_intent("공부할 곳 추천해줘", &rows).is_some());
        assert!(resolver.match_intent("몇 시야?", &rows).is_none());
    }

    #[test]
    fn floor_token_extraction() {
        assert_eq!(extract_floor_token("3층에 뭐 있어?").as_deref(), Some("3층"));
        assert_eq!(extract_floor_token("B1층 알려줘").as_deref(), Some("B1층"));
        assert_eq!(extract_floor_token("6층은?"), None);
        assert_eq!(extract_floor_token("층수 몰라"), None);

        assert_eq!(
            extract_floors("열람실은 2층, 카페는 B1층"),
            vec!["2층".to_string(), "B1층".to_string()]
        );
    }
}
