//! Tests for template selection, rendering, and conditional rule blocks.
//!
//! External interactions: none (builtin templates, pure composition).

use cbot_core::MatchStrength;
use prompt::{compose, render_facility_list, select_template, BuiltinTemplates, PromptContext, TemplateKind};
use storage::{Building, Facility, IntentType, SemanticKeyword};

fn building(id: i64, name: &str, alias: &str, description: &str) -> Building {
    Building {
        id,
        name: name.to_string(),
        alias: alias.to_string(),
        description: description.to_string(),
    }
}

fn facility(id: i64, building_id: i64, name: &str, description: &str) -> Facility {
    Facility {
        id,
        building_id,
        name: name.to_string(),
        category: "학습".to_string(),
        description: description.to_string(),
    }
}

fn semantic(keyword: &str) -> SemanticKeyword {
    SemanticKeyword {
        id: 1,
        keyword: keyword.to_string(),
        alias: String::new(),
        category: String::new(),
    }
}

fn ctx<'a>(
    building: Option<&'a Building>,
    strength: Option<MatchStrength>,
    facilities: &'a [Facility],
    buildings: &'a [Building],
    has_floor: bool,
) -> PromptContext<'a> {
    PromptContext {
        building,
        match_strength: strength,
        semantic: None,
        intent: None,
        has_floor_mentioned: has_floor,
        facilities,
        buildings,
    }
}

#[test]
fn building_with_outside_facilities_selects_building_plus_semantic() {
    let buildings = vec![building(1, "제1공학관", "G관", ""), building(2, "학생회관", "S관", "")];
    let facilities = vec![facility(10, 1, "스터디룸", ""), facility(11, 2, "열람실", "")];
    let c = ctx(Some(&buildings[0]), Some(MatchStrength::Direct), &facilities, &buildings, false);
    assert_eq!(select_template(&c), TemplateKind::BuildingPlusSemantic);
}

#[test]
fn direct_match_without_floor_asks_for_floor_template() {
    let buildings = vec![building(1, "제1공학관", "G관", "1층, 2층")];
    let facilities = vec![facility(10, 1, "스터디룸", "2층")];
    let c = ctx(Some(&buildings[0]), Some(MatchStrength::Direct), &facilities, &buildings, false);
    assert_eq!(select_template(&c), TemplateKind::MatchedFloorUnasked);
}

#[test]
fn floor_mention_or_weak_match_selects_generic_matched() {
    let buildings = vec![building(1, "제1공학관", "G관", "")];
    let facilities = vec![facility(10, 1, "스터디룸", "2층")];

    let with_floor = ctx(Some(&buildings[0]), Some(MatchStrength::Direct), &facilities, &buildings, true);
    assert_eq!(select_template(&with_floor), TemplateKind::Matched);

    let weak = ctx(
        Some(&buildings[0]),
        Some(MatchStrength::FacilityAlias),
        &facilities,
        &buildings,
        false,
    );
    assert_eq!(select_template(&weak), TemplateKind::Matched);

    let inherited = ctx(
        Some(&buildings[0]),
        Some(MatchStrength::Context),
        &facilities,
        &buildings,
        true,
    );
    assert_eq!(select_template(&inherited), TemplateKind::Matched);
}

#[test]
fn no_building_branches_on_facility_presence() {
    let buildings = vec![building(1, "학생회관", "S관", "")];
    let facilities = vec![facility(10, 1, "열람실", "")];

    let with = ctx(None, None, &facilities, &buildings, false);
    assert_eq!(select_template(&with), TemplateKind::SemanticOnly);

    let without = ctx(None, None, &[], &buildings, false);
    assert_eq!(select_template(&without), TemplateKind::NotFound);
}

#[test]
fn facility_list_lines_and_empty_sentinel() {
    let buildings = vec![building(1, "학생회관", "S관, 회관", "")];
    let facilities = vec![
        facility(10, 1, "열람실", "3층 열람실"),
        facility(11, 1, "카페", ""),
        facility(12, 99, "유령시설", ""),
    ];
    let c = ctx(None, None, &facilities, &buildings, false);

    let list = render_facility_list(&c);
    let lines: Vec<&str> = list.lines().collect();
    assert_eq!(lines.len(), 2); // unknown building dropped
    assert_eq!(lines[0], "- 학생회관 (S관) 열람실: 3층 열람실");
    assert_eq!(lines[1], "- 학생회관 (S관) 카페: 설명 없음");

    let empty = ctx(None, None, &[], &buildings, false);
    assert!(render_facility_list(&empty).contains("시설 정보가 없어요"));
}

#[test]
fn compose_substitutes_placeholders_and_sentinels() {
    let buildings = vec![building(1, "제1공학관", "G관, 공학관", "실습실. 1층, 2층")];
    let facilities = vec![facility(10, 1, "스터디룸", "2층")];
    let sem = semantic("공부");
    let c = PromptContext {
        building: Some(&buildings[0]),
        match_strength: Some(MatchStrength::Direct),
        semantic: Some(&sem),
        intent: None,
        has_floor_mentioned: true,
        facilities: &facilities,
        buildings: &buildings,
    };

    let prompt = compose(&BuiltinTemplates, &c).unwrap();
    assert!(prompt.contains("제1공학관"));
    assert!(prompt.contains("공부"));
    assert!(prompt.contains("명확하지 않음")); // unresolved intent sentinel
    assert!(prompt.contains("- 제1공학관 (G관) 스터디룸: 2층"));
    assert!(!prompt.contains("{building_name}"));
    assert!(!prompt.contains("{facility_list}"));
}

#[test]
fn floor_rule_appended_only_for_building_plus_floor() {
    let buildings = vec![building(1, "제1공학관", "G관", "")];
    let facilities = vec![facility(10, 1, "스터디룸", "2층")];

    let with_floor = ctx(Some(&buildings[0]), Some(MatchStrength::Context), &facilities, &buildings, true);
    let prompt = compose(&BuiltinTemplates, &with_floor).unwrap();
    assert!(prompt.contains("[중요 규칙]"));
    assert!(prompt.contains("제1공학관 + 해당 층"));

    let no_floor = ctx(Some(&buildings[0]), Some(MatchStrength::Direct), &facilities, &buildings, false);
    let prompt = compose(&BuiltinTemplates, &no_floor).unwrap();
    assert!(!prompt.contains("[중요 규칙]"));

    // Floor mentioned but no building: no pinning rule.
    let floor_only = ctx(None, None, &facilities, &buildings, true);
    let prompt = compose(&BuiltinTemplates, &floor_only).unwrap();
    assert!(!prompt.contains("[중요 규칙]"));
}

#[test]
fn recommend_rule_appended_for_recommend_intent() {
    let buildings = vec![building(1, "학생회관", "S관", "")];
    let facilities = vec![facility(10, 1, "열람실", "")];
    let intent = IntentType::RecommendRequest;
    let c = PromptContext {
        building: None,
        match_strength: None,
        semantic: None,
        intent: Some(&intent),
        has_floor_mentioned: false,
        facilities: &facilities,
        buildings: &buildings,
    };
    let prompt = compose(&BuiltinTemplates, &c).unwrap();
    assert!(prompt.contains("[추천 규칙]"));
    assert!(prompt.contains("추천 요청")); // intent tag rendered

    let locate = IntentType::LocateRequest;
    let c2 = PromptContext { intent: Some(&locate), ..c };
    let prompt = compose(&BuiltinTemplates, &c2).unwrap();
    assert!(!prompt.contains("[추천 규칙]"));
}
