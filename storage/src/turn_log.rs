//! Conversation log repository: append turns, read continuation state,
//! list sessions, delete a session with contiguous renumbering.
//!
//! The log is append-mostly. The only structural mutation is the
//! renumbering pass after a session delete, implemented as a best-effort
//! per-row stage → verify → delete migration (no cross-row transaction);
//! a crash mid-pass leaves a partially renumbered set, which is an
//! accepted degraded state.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::info;

use crate::error::StorageError;
use crate::models::TurnRecord;
use crate::sqlite_pool::SqlitePoolManager;
use cbot_core::{QaPair, Role, SessionSummary};

/// Width of the numeric part of generated doc ids (Q00001, A00001, ...).
const DOC_SEQ_WIDTH: usize = 5;

#[derive(Clone)]
pub struct TurnLogRepository {
    pool_manager: SqlitePoolManager,
}

impl TurnLogRepository {
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        let pool_manager = SqlitePoolManager::new(database_url).await?;
        Self::with_pool(pool_manager).await
    }

    /// Shares an existing pool (catalog and turn log live in one file).
    pub async fn with_pool(pool_manager: SqlitePoolManager) -> Result<Self, StorageError> {
        let repo = Self { pool_manager };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<(), StorageError> {
        info!("Creating turns table if not exist");

        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS turns (
                user_uid TEXT NOT NULL,
                doc_id TEXT NOT NULL,
                session_id TEXT NOT NULL,
                session_number INTEGER NOT NULL,
                log_index INTEGER NOT NULL DEFAULT 0,
                role TEXT NOT NULL,
                message TEXT NOT NULL,
                session_title TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                answered_facilities TEXT NOT NULL DEFAULT '[]',
                remaining_facilities TEXT NOT NULL DEFAULT '[]',
                semantic_keyword TEXT NOT NULL DEFAULT '',
                matched_building_id INTEGER,
                floor_token TEXT NOT NULL DEFAULT '',
                PRIMARY KEY (user_uid, doc_id)
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_turns_user_session ON turns(user_uid, session_number);
            CREATE INDEX IF NOT EXISTS idx_turns_session_id ON turns(user_uid, session_id);
            CREATE INDEX IF NOT EXISTS idx_turns_timestamp ON turns(timestamp);
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Next generated doc id for this user and role: prefix + zero-padded
    /// count of existing same-prefix docs + 1. Monotonic per user per
    /// role; concurrent writers may collide (accepted, last-write-wins
    /// at the request level).
    pub async fn next_doc_id(&self, user_uid: &str, role: Role) -> Result<String, StorageError> {
        let prefix = role.doc_prefix();
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM turns WHERE user_uid = ? AND doc_id LIKE ?")
                .bind(user_uid)
                .bind(format!("{}%", prefix))
                .fetch_one(self.pool_manager.pool())
                .await?;
        Ok(format!("{}{:0width$}", prefix, count.0 + 1, width = DOC_SEQ_WIDTH))
    }

    /// Appends one immutable turn row.
    pub async fn append(&self, turn: &TurnRecord) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO turns (
                user_uid, doc_id, session_id, session_number, log_index, role,
                message, session_title, timestamp, answered_facilities,
                remaining_facilities, semantic_keyword, matched_building_id, floor_token
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&turn.user_uid)
        .bind(&turn.doc_id)
        .bind(&turn.session_id)
        .bind(turn.session_number)
        .bind(turn.log_index)
        .bind(&turn.role)
        .bind(&turn.message)
        .bind(&turn.session_title)
        .bind(turn.timestamp)
        .bind(&turn.answered_facilities)
        .bind(&turn.remaining_facilities)
        .bind(&turn.semantic_keyword)
        .bind(turn.matched_building_id)
        .bind(&turn.floor_token)
        .execute(self.pool_manager.pool())
        .await?;

        info!(
            user_uid = %turn.user_uid,
            doc_id = %turn.doc_id,
            session_number = turn.session_number,
            role = %turn.role,
            "Appended turn"
        );
        Ok(())
    }

    /// Most recent assistant turns for a user+session, newest first.
    pub async fn last_assistant_turns(
        &self,
        user_uid: &str,
        session_number: i64,
        limit: i64,
    ) -> Result<Vec<TurnRecord>, StorageError> {
        let rows = sqlx::query_as::<_, TurnRecord>(
            r#"
            SELECT * FROM turns
            WHERE user_uid = ? AND session_number = ? AND role = 'assistant'
            ORDER BY timestamp DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(user_uid)
        .bind(session_number)
        .bind(limit)
        .fetch_all(self.pool_manager.pool())
        .await?;
        Ok(rows)
    }

    /// The single most recent assistant turn, if any.
    pub async fn last_assistant_turn(
        &self,
        user_uid: &str,
        session_number: i64,
    ) -> Result<Option<TurnRecord>, StorageError> {
        Ok(self
            .last_assistant_turns(user_uid, session_number, 1)
            .await?
            .into_iter()
            .next())
    }

    /// First building id recorded by an assistant turn, scanning newest
    /// first. Lets a bare floor-only follow-up inherit the building the
    /// conversation was already about.
    pub async fn last_matched_building_id(
        &self,
        user_uid: &str,
        session_number: i64,
    ) -> Result<Option<i64>, StorageError> {
        let row: Option<(i64,)> = sqlx::query_as(
            r#"
            SELECT matched_building_id FROM turns
            WHERE user_uid = ? AND session_number = ? AND role = 'assistant'
              AND matched_building_id IS NOT NULL
            ORDER BY timestamp DESC, rowid DESC
            LIMIT 1
            "#,
        )
        .bind(user_uid)
        .bind(session_number)
        .fetch_optional(self.pool_manager.pool())
        .await?;
        Ok(row.map(|r| r.0))
    }

    /// Count of user-role turns already in the session (the log_index of
    /// the next Q/A pair).
    pub async fn user_turn_count(
        &self,
        user_uid: &str,
        session_number: i64,
    ) -> Result<i64, StorageError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM turns WHERE user_uid = ? AND session_number = ? AND role = 'user'",
        )
        .bind(user_uid)
        .bind(session_number)
        .fetch_one(self.pool_manager.pool())
        .await?;
        Ok(count.0)
    }

    /// Title stored by the earliest turn of the session, if the session
    /// already exists. New pairs inherit it so one session keeps one title.
    pub async fn session_title(
        &self,
        user_uid: &str,
        session_number: i64,
    ) -> Result<Option<String>, StorageError> {
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT session_title FROM turns
            WHERE user_uid = ? AND session_number = ?
            ORDER BY timestamp ASC, rowid ASC
            LIMIT 1
            "#,
        )
        .bind(user_uid)
        .bind(session_number)
        .fetch_optional(self.pool_manager.pool())
        .await?;
        Ok(row.map(|r| r.0))
    }

    /// All sessions for a user: Q/A pairs in time order, a trailing
    /// unanswered question dropped, ordered by earliest turn ascending.
    pub async fn list_sessions(&self, user_uid: &str) -> Result<Vec<SessionSummary>, StorageError> {
        let rows = sqlx::query_as::<_, TurnRecord>(
            "SELECT * FROM turns WHERE user_uid = ? ORDER BY timestamp ASC, rowid ASC",
        )
        .bind(user_uid)
        .fetch_all(self.pool_manager.pool())
        .await?;

        struct Group {
            title: String,
            created_at: Option<DateTime<Utc>>,
            logs: Vec<QaPair>,
            pending_question: Option<String>,
        }

        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Group> = HashMap::new();

        for row in rows {
            let group = groups.entry(row.session_id.clone()).or_insert_with(|| {
                order.push(row.session_id.clone());
                Group {
                    title: if row.session_title.is_empty() {
                        row.session_id.clone()
                    } else {
                        row.session_title.clone()
                    },
                    created_at: Some(row.timestamp),
                    logs: Vec::new(),
                    pending_question: None,
                }
            });

            match Role::from_str(&row.role) {
                Some(Role::User) => group.pending_question = Some(row.message),
                Some(Role::Assistant) => {
                    if let Some(question) = group.pending_question.take() {
                        group.logs.push(QaPair {
                            question,
                            answer: row.message,
                        });
                    }
                }
                None => {}
            }
        }

        let mut sessions: Vec<SessionSummary> = order
            .into_iter()
            .filter_map(|sid| groups.remove(&sid))
            .map(|g| SessionSummary {
                session_name: strip_number_suffix(&g.title).to_string(),
                logs: g.logs,
                created_at: g.created_at,
            })
            .collect();

        sessions.sort_by_key(|s| s.created_at);
        Ok(sessions)
    }

    /// Deletes every turn of a session, then renumbers all later
    /// sessions for the user down by one. Returns the smallest deleted
    /// session number, or None when the session id matched nothing.
    pub async fn delete_session(
        &self,
        user_uid: &str,
        session_id: &str,
    ) -> Result<Option<i64>, StorageError> {
        let targets = sqlx::query_as::<_, TurnRecord>(
            "SELECT * FROM turns WHERE user_uid = ? AND session_id = ?",
        )
        .bind(user_uid)
        .bind(session_id)
        .fetch_all(self.pool_manager.pool())
        .await?;

        if targets.is_empty() {
            return Ok(None);
        }

        let deleted_number = targets
            .iter()
            .map(|t| t.session_number)
            .min()
            .unwrap_or_default();

        sqlx::query("DELETE FROM turns WHERE user_uid = ? AND session_id = ?")
            .bind(user_uid)
            .bind(session_id)
            .execute(self.pool_manager.pool())
            .await?;

        info!(
            user_uid = %user_uid,
            session_id = %session_id,
            deleted_turns = targets.len(),
            deleted_number = deleted_number,
            "Deleted session"
        );

        self.renumber_after(user_uid, deleted_number).await?;
        Ok(Some(deleted_number))
    }

    /// Shifts every session numbered above `deleted_number` down by one.
    ///
    /// Rows whose doc id has the generated `Q/A<seq>` shape get a new id
    /// with sequence − 1 (stage new row, verify, delete old — processed
    /// in ascending sequence order so the target slot is always free);
    /// rows with any other id shape are updated in place.
    async fn renumber_after(
        &self,
        user_uid: &str,
        deleted_number: i64,
    ) -> Result<(), StorageError> {
        let affected = sqlx::query_as::<_, TurnRecord>(
            "SELECT * FROM turns WHERE user_uid = ? AND session_number > ?",
        )
        .bind(user_uid)
        .bind(deleted_number)
        .fetch_all(self.pool_manager.pool())
        .await?;

        let mut sequenced: Vec<(TurnRecord, &'static str, i64)> = Vec::new();
        let mut in_place: Vec<TurnRecord> = Vec::new();
        for row in affected {
            match parse_doc_id(&row.doc_id) {
                Some((prefix, seq)) => sequenced.push((row, prefix, seq)),
                None => in_place.push(row),
            }
        }
        sequenced.sort_by_key(|(_, _, seq)| *seq);

        for row in in_place {
            let new_number = row.session_number - 1;
            let new_session_id = rewrite_session_id(&row.session_id, new_number);
            sqlx::query(
                "UPDATE turns SET session_number = ?, session_id = ? WHERE user_uid = ? AND doc_id = ?",
            )
            .bind(new_number)
            .bind(&new_session_id)
            .bind(user_uid)
            .bind(&row.doc_id)
            .execute(self.pool_manager.pool())
            .await?;
        }

        for (row, prefix, seq) in sequenced {
            let new_number = row.session_number - 1;
            let new_session_id = rewrite_session_id(&row.session_id, new_number);
            let new_doc_id = format!("{}{:0width$}", prefix, seq - 1, width = DOC_SEQ_WIDTH);

            let mut staged = row.clone();
            staged.doc_id = new_doc_id.clone();
            staged.session_number = new_number;
            staged.session_id = new_session_id;

            // Stage the new row, verify it landed, only then drop the old one.
            self.append(&staged).await?;
            let check: (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM turns WHERE user_uid = ? AND doc_id = ?")
                    .bind(user_uid)
                    .bind(&new_doc_id)
                    .fetch_one(self.pool_manager.pool())
                    .await?;
            if check.0 != 1 {
                return Err(StorageError::Database(format!(
                    "renumber staging failed for {}",
                    new_doc_id
                )));
            }
            sqlx::query("DELETE FROM turns WHERE user_uid = ? AND doc_id = ?")
                .bind(user_uid)
                .bind(&row.doc_id)
                .execute(self.pool_manager.pool())
                .await?;
        }

        Ok(())
    }
}

/// Parses a generated `Q<seq>` / `A<seq>` doc id. Any other shape
/// (manual imports, migrated data) returns None and keeps its id.
fn parse_doc_id(doc_id: &str) -> Option<(&'static str, i64)> {
    let prefix = match doc_id.as_bytes().first()? {
        b'Q' => "Q",
        b'A' => "A",
        _ => return None,
    };
    let rest = &doc_id[1..];
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse::<i64>().ok().map(|seq| (prefix, seq))
}

/// Replaces the `_<number>` suffix of a session id with the new number,
/// zero-padded to three digits.
fn rewrite_session_id(session_id: &str, new_number: i64) -> String {
    let base = match session_id.rsplit_once('_') {
        Some((base, _)) => base,
        None => session_id,
    };
    format!("{}_{:03}", base, new_number)
}

/// Display name for a session title: drops a trailing `_<digits>` suffix.
fn strip_number_suffix(title: &str) -> &str {
    match title.rsplit_once('_') {
        Some((base, suffix)) if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) => {
            base
        }
        _ => title,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_doc_id_accepts_generated_shape_only() {
        assert_eq!(parse_doc_id("Q00004"), Some(("Q", 4)));
        assert_eq!(parse_doc_id("A00123"), Some(("A", 123)));
        assert_eq!(parse_doc_id("Q"), None);
        assert_eq!(parse_doc_id("B00001"), None);
        assert_eq!(parse_doc_id("Q12x"), None);
        assert_eq!(parse_doc_id("legacy-7"), None);
    }

    #[test]
    fn rewrite_session_id_keeps_title() {
        assert_eq!(rewrite_session_id("공학관 안내_003", 2), "공학관 안내_002");
        assert_eq!(rewrite_session_id("notitle", 0), "notitle_000");
    }

    #[test]
    fn strip_number_suffix_only_for_digits() {
        assert_eq!(strip_number_suffix("공학관 안내_003"), "공학관 안내");
        assert_eq!(strip_number_suffix("공학관 안내"), "공학관 안내");
        assert_eq!(strip_number_suffix("a_b"), "a_b");
    }
}
