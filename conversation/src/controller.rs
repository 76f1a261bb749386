//! ConversationController: the per-message state machine.
//!
//! Each incoming message lands in one of four states: FOLLOWup continues
//! the previous answer's pagination, FloorClarificationNeeded asks which
//! floor before calling the model, NormalAnswer composes a prompt and
//! delegates to the completion model, NoMoreResults is the terminal
//! reply when a follow-up finds nothing left. Every collaborator is
//! injected; nothing here holds ambient globals.

use std::sync::Arc;

use tracing::{error, info, instrument};

use cbot_core::{
    ChatError, ChatReply, ChatRequest, DeleteOutcome, MatchStrength, Role, SessionSummary,
};
use llm_client::LlmClient;
use prompt::{compose, PromptContext, TemplateSource};
use storage::{
    Building, CatalogRepository, Checkpoint, Facility, StorageError, TurnLogRepository, TurnRecord,
};

use crate::auth::IdentityVerifier;
use crate::followup::is_followup;
use crate::matcher::{extract_floor_token, extract_floors, KeywordResolver};
use crate::reply::parse_model_reply;
use crate::retriever;

/// Terminal reply when a follow-up has nothing left to page through.
const NO_MORE_MESSAGE: &str = "더 이상 추천할 시설이 없어요.";
const NO_MORE_TITLE: &str = "추천 종료";
/// Session title when the model reply did not carry one.
const DEFAULT_TITLE: &str = "새로운 세션";

/// State a message resolves to; logged per turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TurnState {
    Followup,
    FloorClarificationNeeded,
    NormalAnswer,
    NoMoreResults,
}

pub struct ConversationController {
    catalog: CatalogRepository,
    turn_log: TurnLogRepository,
    llm: Arc<dyn LlmClient>,
    templates: Arc<dyn TemplateSource>,
    verifier: Arc<dyn IdentityVerifier>,
    resolver: KeywordResolver,
}

impl ConversationController {
    pub fn new(
        catalog: CatalogRepository,
        turn_log: TurnLogRepository,
        llm: Arc<dyn LlmClient>,
        templates: Arc<dyn TemplateSource>,
        verifier: Arc<dyn IdentityVerifier>,
        resolver: KeywordResolver,
    ) -> Self {
        Self {
            catalog,
            turn_log,
            llm,
            templates,
            verifier,
            resolver,
        }
    }

    /// Handles one chat message end to end: verify identity, branch the
    /// state machine, persist the Q/A pair, return the reply.
    #[instrument(skip(self, request))]
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, ChatError> {
        if request.id_token.trim().is_empty() || request.message.trim().is_empty() {
            return Err(ChatError::Input("id_token 또는 message 누락".to_string()));
        }
        let user_uid = self
            .verifier
            .verify(&request.id_token)
            .await
            .map_err(|e| ChatError::Auth(e.to_string()))?;
        let session_number = request.current_session_idx;
        let message = request.message.as_str();

        info!(user_uid = %user_uid, session_number, "Q: {}", message);

        if is_followup(message) {
            return self.handle_followup(&user_uid, session_number, message).await;
        }
        self.handle_query(&user_uid, session_number, message).await
    }

    /// FOLLOWUP / NO_MORE_RESULTS: page the previous answer's remaining
    /// set, or close out without a model call or store write.
    async fn handle_followup(
        &self,
        user_uid: &str,
        session_number: i64,
        message: &str,
    ) -> Result<ChatReply, ChatError> {
        let last = self
            .turn_log
            .last_assistant_turn(user_uid, session_number)
            .await
            .map_err(store_err)?;

        let Some(last) = last else {
            info!(user_uid, state = ?TurnState::NoMoreResults, "Follow-up with no prior turn");
            return Ok(ChatReply {
                message: NO_MORE_MESSAGE.to_string(),
                session_title: NO_MORE_TITLE.to_string(),
            });
        };

        let checkpoint = last.checkpoint().map_err(store_err)?;
        let page = retriever::followup_page(&self.catalog, &checkpoint)
            .await
            .map_err(store_err)?;

        let Some(page) = page else {
            info!(user_uid, state = ?TurnState::NoMoreResults, "Remaining set exhausted");
            return Ok(ChatReply {
                message: NO_MORE_MESSAGE.to_string(),
                session_title: if last.session_title.is_empty() {
                    NO_MORE_TITLE.to_string()
                } else {
                    last.session_title
                },
            });
        };

        let buildings = self.catalog.buildings().await.map_err(store_err)?;
        let answer = render_facility_lines(&page.facilities, &buildings);

        let next_checkpoint = Checkpoint {
            semantic_keyword: checkpoint.semantic_keyword.clone(),
            answered: page.answered,
            remaining: page.remaining,
            matched_building_id: checkpoint.matched_building_id,
            floor_token: String::new(),
        };

        info!(
            user_uid,
            state = ?TurnState::Followup,
            answered = next_checkpoint.answered.len(),
            remaining = next_checkpoint.remaining.len(),
            "Serving follow-up page"
        );

        self.persist_pair(
            user_uid,
            &last.session_id,
            session_number,
            message,
            &answer,
            &last.session_title,
            &next_checkpoint,
        )
        .await
        .map_err(store_err)?;

        Ok(ChatReply {
            message: answer,
            session_title: last.session_title,
        })
    }

    /// Fresh query: resolve keywords, retrieve facilities, then either
    /// ask a clarifying floor question or call the completion model.
    async fn handle_query(
        &self,
        user_uid: &str,
        session_number: i64,
        message: &str,
    ) -> Result<ChatReply, ChatError> {
        let buildings = self.catalog.buildings().await.map_err(store_err)?;
        let semantics = self.catalog.semantic_keywords().await.map_err(store_err)?;
        let intents = self.catalog.intent_keywords().await.map_err(store_err)?;

        let mut matched: Option<(Building, MatchStrength)> = self
            .resolver
            .match_building(message, &buildings)
            .map(|(b, s)| (b.clone(), s));
        let semantic = self.resolver.match_semantic(message, &semantics).cloned();
        let intent = self
            .resolver
            .match_intent(message, &intents)
            .map(|row| row.intent());
        let floor_token = extract_floor_token(message);

        // A bare floor question inherits the building the session was
        // already talking about.
        if matched.is_none() && floor_token.is_some() {
            if let Some(bid) = self
                .turn_log
                .last_matched_building_id(user_uid, session_number)
                .await
                .map_err(store_err)?
            {
                if let Some(b) = self.catalog.building_by_id(bid).await.map_err(store_err)? {
                    matched = Some((b, MatchStrength::Context));
                }
            }
        }

        let building = matched.as_ref().map(|(b, _)| b);
        let strength = matched.as_ref().map(|(_, s)| *s);

        let retrieval = retriever::retrieve(
            &self.catalog,
            &self.turn_log,
            user_uid,
            session_number,
            semantic.as_ref(),
            building,
            intent.as_ref(),
        )
        .await
        .map_err(store_err)?;
        let facilities = retriever::filter_by_floor(retrieval.facilities, floor_token.as_deref());

        // A confirmed building with floor info but no floor in the
        // question gets a clarifying question instead of a model answer.
        if let Some((b, s)) = &matched {
            if s.is_direct() && floor_token.is_none() {
                let floors = extract_floors(&b.description);
                if !floors.is_empty() {
                    let keyword = semantic
                        .as_ref()
                        .map(|s| s.keyword.clone())
                        .unwrap_or_default();
                    return self
                        .floor_clarification(user_uid, session_number, message, b, keyword, &floors)
                        .await;
                }
            }
        }

        let ctx = PromptContext {
            building,
            match_strength: strength,
            semantic: semantic.as_ref(),
            intent: intent.as_ref(),
            has_floor_mentioned: floor_token.is_some(),
            facilities: &facilities,
            buildings: &buildings,
        };
        let system_prompt =
            compose(self.templates.as_ref(), &ctx).map_err(|e| ChatError::Collaborator(e.to_string()))?;

        let raw_reply = self
            .llm
            .complete(&system_prompt, message)
            .await
            .map_err(|e| {
                error!(error = %e, user_uid, "Completion model call failed");
                ChatError::Collaborator(e.to_string())
            })?;

        let (answer, mut title) = parse_model_reply(&raw_reply);
        if title.is_empty() {
            title = DEFAULT_TITLE.to_string();
        }
        // A floor question pins the title to building + floor.
        if let (Some(b), Some(floor)) = (building, floor_token.as_deref()) {
            title = format!("{} {} 안내", b.name, floor);
        }
        let (session_id, title) = self
            .session_identity(user_uid, session_number, title)
            .await
            .map_err(store_err)?;

        let checkpoint = Checkpoint {
            semantic_keyword: semantic.map(|s| s.keyword).unwrap_or_default(),
            answered: facilities.iter().map(|f| f.id).collect(),
            remaining: retrieval.remaining,
            matched_building_id: building.map(|b| b.id),
            floor_token: floor_token.unwrap_or_default(),
        };

        info!(
            user_uid,
            state = ?TurnState::NormalAnswer,
            session_id = %session_id,
            answered = checkpoint.answered.len(),
            remaining = checkpoint.remaining.len(),
            "Persisting model answer"
        );

        self.persist_pair(
            user_uid,
            &session_id,
            session_number,
            message,
            &answer,
            &title,
            &checkpoint,
        )
        .await
        .map_err(store_err)?;

        Ok(ChatReply {
            message: answer,
            session_title: title,
        })
    }

    /// FLOOR_CLARIFICATION_NEEDED: synthesized question listing the
    /// available floors; the building id is recorded so the floor-only
    /// follow-up can inherit it, facility tracking stays empty.
    async fn floor_clarification(
        &self,
        user_uid: &str,
        session_number: i64,
        message: &str,
        building: &Building,
        semantic_keyword: String,
        floors: &[String],
    ) -> Result<ChatReply, ChatError> {
        let answer = format!(
            "{0}에는 다양한 층별 공간이 있어요. ({1})\n특별히 {0}의 어느 층에 대해 궁금하신가요?",
            building.name,
            floors.join(", ")
        );
        let title = format!("{} 층 정보 요청", building.name);
        let (session_id, title) = self
            .session_identity(user_uid, session_number, title)
            .await
            .map_err(store_err)?;

        let checkpoint = Checkpoint {
            semantic_keyword,
            answered: Vec::new(),
            remaining: Vec::new(),
            matched_building_id: Some(building.id),
            floor_token: String::new(),
        };

        info!(
            user_uid,
            state = ?TurnState::FloorClarificationNeeded,
            building = %building.name,
            "Asking which floor"
        );

        self.persist_pair(
            user_uid,
            &session_id,
            session_number,
            message,
            &answer,
            &title,
            &checkpoint,
        )
        .await
        .map_err(store_err)?;

        Ok(ChatReply {
            message: answer,
            session_title: title,
        })
    }

    /// All past sessions of the token's user, earliest first.
    #[instrument(skip(self, id_token))]
    pub async fn list_sessions(&self, id_token: &str) -> Result<Vec<SessionSummary>, ChatError> {
        if id_token.trim().is_empty() {
            return Err(ChatError::Input("ID 토큰 누락".to_string()));
        }
        let user_uid = self
            .verifier
            .verify(id_token)
            .await
            .map_err(|e| ChatError::Auth(e.to_string()))?;
        self.turn_log.list_sessions(&user_uid).await.map_err(store_err)
    }

    /// Deletes one session and renumbers the user's later sessions.
    #[instrument(skip(self, id_token))]
    pub async fn delete_session(
        &self,
        id_token: &str,
        session_id: &str,
    ) -> Result<DeleteOutcome, ChatError> {
        if id_token.trim().is_empty() || session_id.trim().is_empty() {
            return Err(ChatError::Input("ID 토큰 또는 세션 ID가 누락되었습니다.".to_string()));
        }
        let user_uid = self
            .verifier
            .verify(id_token)
            .await
            .map_err(|e| ChatError::Auth(e.to_string()))?;

        match self
            .turn_log
            .delete_session(&user_uid, session_id)
            .await
            .map_err(store_err)?
        {
            Some(deleted_number) => Ok(DeleteOutcome {
                message: format!("세션 '{}' 삭제 성공", session_id),
                renumbered_from: Some(deleted_number),
            }),
            None => Err(ChatError::NotFound(format!(
                "세션 '{}'을(를) 찾을 수 없습니다.",
                session_id
            ))),
        }
    }

    /// Session id and title for a turn pair: an existing session keeps
    /// the title its earliest turn recorded.
    async fn session_identity(
        &self,
        user_uid: &str,
        session_number: i64,
        derived_title: String,
    ) -> Result<(String, String), StorageError> {
        let title = self
            .turn_log
            .session_title(user_uid, session_number)
            .await?
            .unwrap_or(derived_title);
        let session_id = format!("{}_{:03}", title, session_number);
        Ok((session_id, title))
    }

    /// Appends the Q/A pair for this turn (same log_index on both rows).
    async fn persist_pair(
        &self,
        user_uid: &str,
        session_id: &str,
        session_number: i64,
        question: &str,
        answer: &str,
        title: &str,
        checkpoint: &Checkpoint,
    ) -> Result<(), StorageError> {
        let log_index = self.turn_log.user_turn_count(user_uid, session_number).await?;

        let q_id = self.turn_log.next_doc_id(user_uid, Role::User).await?;
        let q = TurnRecord::user(
            user_uid,
            q_id,
            session_id,
            session_number,
            log_index,
            question,
            title,
        );
        self.turn_log.append(&q).await?;

        let a_id = self.turn_log.next_doc_id(user_uid, Role::Assistant).await?;
        let a = TurnRecord::assistant(
            user_uid,
            a_id,
            session_id,
            session_number,
            log_index,
            answer,
            title,
            checkpoint,
        )?;
        self.turn_log.append(&a).await?;
        Ok(())
    }
}

/// One line per facility: `- {building} {name}: {description}`.
fn render_facility_lines(facilities: &[Facility], buildings: &[Building]) -> String {
    facilities
        .iter()
        .map(|f| {
            let building_name = buildings
                .iter()
                .find(|b| b.id == f.building_id)
                .map(|b| b.name.as_str())
                .unwrap_or("");
            format!("- {} {}: {}", building_name, f.name, f.description)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn store_err(e: StorageError) -> ChatError {
    error!(error = %e, "Storage operation failed");
    ChatError::Collaborator(e.to_string())
}
