//! # Prompt
//!
//! Composes the system prompt sent to the completion model: picks one of
//! five templates from the match state, renders it with building /
//! keyword / facility placeholders, and appends conditional rule blocks
//! (floor pinning, recommendation style).
//!
//! ## External interactions
//!
//! - **AI models**: output is sent as the system message of a chat
//!   completion request.
//! - **Template files**: [`FsTemplateSource`] reads `system_prompt_*.txt`
//!   from a directory; [`BuiltinTemplates`] serves the embedded copies.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use cbot_core::MatchStrength;
use storage::{Building, Facility, IntentType, SemanticKeyword};

/// Sentinel used where a building value is absent.
const NONE_SENTINEL: &str = "없음";
/// Sentinel for an absent building description.
const NO_BUILDING_INFO: &str = "해당 건물 정보 없음";
/// Sentinel for an unresolved intent.
const UNCLEAR_INTENT: &str = "명확하지 않음";
/// Facility-list line when no facility is available.
const EMPTY_FACILITY_LIST: &str = "- 현재 제공할 수 있는 시설 정보가 없어요.";

/// The five system prompt templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// Building matched and related facilities exist outside it too.
    BuildingPlusSemantic,
    /// Building matched; floor mentioned or the match was not direct.
    Matched,
    /// Building matched directly but the user has not named a floor.
    MatchedFloorUnasked,
    /// No building, but semantic facilities to present.
    SemanticOnly,
    /// Nothing matched.
    NotFound,
}

impl TemplateKind {
    /// Template file name under the prompts directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            TemplateKind::BuildingPlusSemantic => "system_prompt_building_plus_semantic.txt",
            TemplateKind::Matched => "system_prompt_matched.txt",
            TemplateKind::MatchedFloorUnasked => "system_prompt_matched_and_floor_unmatched.txt",
            TemplateKind::SemanticOnly => "system_prompt_semantic_only.txt",
            TemplateKind::NotFound => "system_prompt_notfound.txt",
        }
    }
}

/// Source of template text. Filesystem in production, builtin copies as
/// fallback, an in-memory map in tests.
pub trait TemplateSource: Send + Sync {
    fn template(&self, kind: TemplateKind) -> Result<String>;
}

/// Loads templates from `<dir>/system_prompt_*.txt`.
pub struct FsTemplateSource {
    dir: PathBuf,
}

impl FsTemplateSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl TemplateSource for FsTemplateSource {
    fn template(&self, kind: TemplateKind) -> Result<String> {
        let path = self.dir.join(kind.file_name());
        std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read template {}", path.display()))
    }
}

/// Serves the templates embedded at build time. Keeps the engine usable
/// without a prompts directory on disk.
pub struct BuiltinTemplates;

impl TemplateSource for BuiltinTemplates {
    fn template(&self, kind: TemplateKind) -> Result<String> {
        let text = match kind {
            TemplateKind::BuildingPlusSemantic => {
                include_str!("../prompts/system_prompt_building_plus_semantic.txt")
            }
            TemplateKind::Matched => include_str!("../prompts/system_prompt_matched.txt"),
            TemplateKind::MatchedFloorUnasked => {
                include_str!("../prompts/system_prompt_matched_and_floor_unmatched.txt")
            }
            TemplateKind::SemanticOnly => {
                include_str!("../prompts/system_prompt_semantic_only.txt")
            }
            TemplateKind::NotFound => include_str!("../prompts/system_prompt_notfound.txt"),
        };
        Ok(text.to_string())
    }
}

/// Everything the composer needs about the current turn.
pub struct PromptContext<'a> {
    pub building: Option<&'a Building>,
    pub match_strength: Option<MatchStrength>,
    pub semantic: Option<&'a SemanticKeyword>,
    pub intent: Option<&'a IntentType>,
    pub has_floor_mentioned: bool,
    pub facilities: &'a [Facility],
    /// Building table for rendering facility lines (owner name + alias).
    pub buildings: &'a [Building],
}

impl<'a> PromptContext<'a> {
    fn building_of(&self, facility: &Facility) -> Option<&'a Building> {
        self.buildings.iter().find(|b| b.id == facility.building_id)
    }
}

/// Picks the template per the decision table: building with outside
/// facilities → BuildingPlusSemantic; building with floor mentioned or a
/// non-direct match → Matched; building otherwise → MatchedFloorUnasked;
/// no building → SemanticOnly when facilities exist, else NotFound.
pub fn select_template(ctx: &PromptContext) -> TemplateKind {
    match ctx.building {
        Some(building) => {
            let outside = ctx
                .facilities
                .iter()
                .any(|f| f.building_id != building.id);
            if outside {
                TemplateKind::BuildingPlusSemantic
            } else if ctx.has_floor_mentioned
                || !ctx.match_strength.map(|s| s.is_direct()).unwrap_or(false)
            {
                TemplateKind::Matched
            } else {
                TemplateKind::MatchedFloorUnasked
            }
        }
        None => {
            if ctx.facilities.is_empty() {
                TemplateKind::NotFound
            } else {
                TemplateKind::SemanticOnly
            }
        }
    }
}

/// One facility per line: `- {building} ({first alias}) {name}: {description}`.
/// Facilities whose building is unknown are skipped.
pub fn render_facility_list(ctx: &PromptContext) -> String {
    if ctx.facilities.is_empty() {
        return EMPTY_FACILITY_LIST.to_string();
    }
    let lines: Vec<String> = ctx
        .facilities
        .iter()
        .filter_map(|f| {
            let building = ctx.building_of(f)?;
            let description = if f.description.is_empty() {
                "설명 없음"
            } else {
                &f.description
            };
            Some(format!(
                "- {} ({}) {}: {}",
                building.name,
                building.first_alias(),
                f.name,
                description
            ))
        })
        .collect();
    if lines.is_empty() {
        EMPTY_FACILITY_LIST.to_string()
    } else {
        lines.join("\n")
    }
}

/// Selects, renders, and extends the system prompt for one turn.
pub fn compose(source: &dyn TemplateSource, ctx: &PromptContext) -> Result<String> {
    let kind = select_template(ctx);
    info!(
        template = kind.file_name(),
        building = ctx.building.map(|b| b.name.as_str()).unwrap_or(NONE_SENTINEL),
        semantic = ctx.semantic.map(|s| s.keyword.as_str()).unwrap_or(NONE_SENTINEL),
        facility_count = ctx.facilities.len(),
        "Composing system prompt"
    );

    let template = source.template(kind)?;
    let mut prompt = render(&template, ctx);

    if ctx.has_floor_mentioned {
        if let Some(building) = ctx.building {
            prompt.push_str(&floor_rule(&building.name));
        }
    }
    if matches!(ctx.intent, Some(IntentType::RecommendRequest)) {
        prompt.push_str(RECOMMEND_RULE);
    }

    Ok(prompt)
}

fn render(template: &str, ctx: &PromptContext) -> String {
    let (building_name, building_alias, building_description) = match ctx.building {
        Some(b) => (b.name.as_str(), b.alias.as_str(), b.description.as_str()),
        None => (NONE_SENTINEL, NONE_SENTINEL, NO_BUILDING_INFO),
    };
    let semantic_keyword = ctx
        .semantic
        .map(|s| s.keyword.as_str())
        .unwrap_or(NONE_SENTINEL);
    let intent_type = ctx.intent.map(|i| i.as_tag()).unwrap_or(UNCLEAR_INTENT);

    template
        .replace("{building_name}", building_name)
        .replace("{building_alias}", building_alias)
        .replace("{building_description}", building_description)
        .replace("{semantic_keyword}", semantic_keyword)
        .replace("{intent_type}", intent_type)
        .replace("{facility_list}", &render_facility_list(ctx))
}

/// Pins answers to the building + requested floor when the user names a
/// floor after a building was established.
fn floor_rule(building_name: &str) -> String {
    format!(
        "\n\n[중요 규칙]\n\
         - 사용자가 '{0}'을(를) 먼저 물어본 후, 다음 질문에서 단순히 '2층', '4층 알려줘', '1층 말해줘'와 같이 층 정보만 언급하면\n\
         반드시 '{0} + 해당 층' 조합으로 시설 정보를 답변해야 한다.\n\
         - 불필요한 다른 층 설명은 하지 말고, 요청한 층의 시설만 간단명료하게 알려줘라.\n",
        building_name
    )
}

/// Appended when the intent is a recommendation request.
const RECOMMEND_RULE: &str = "\n\n[추천 규칙]\n\
- 사용자가 추천을 요청하면 반드시 시설 목록에서 1~2개를 선택해 추천해야 한다.\n\
- 같은 건물에 같은 종류의 시설이 여러 개 있어도 중복으로 설명하지 말고, 해당 건물에서는 대표적인 하나만 추천해라.\n\
- 답변은 '~을 추천드려요', '~이 괜찮습니다' 같은 문장으로 표현할 것.\n\
- 반드시 시설 이름과 간단한 설명을 포함해야 한다.\n\
- 여러 건물의 시설이 가능하다면 건물별로 하나씩만 추천해서 2곳 정도 추천해라.\n";
