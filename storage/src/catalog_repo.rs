//! Campus catalog repository: buildings, keywords, facilities, relations.
//!
//! Read-mostly lookup tables for the resolver and retriever; the insert
//! helpers exist for seeding and tests. Row order (primary key ascending)
//! is the canonical match and pagination order, so every listing query
//! orders by id explicitly.

use tracing::info;

use crate::error::StorageError;
use crate::models::{Building, Facility, IntentKeyword, SemanticKeyword};
use crate::sqlite_pool::SqlitePoolManager;

#[derive(Clone)]
pub struct CatalogRepository {
    pool_manager: SqlitePoolManager,
}

impl CatalogRepository {
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
        info!("Creating catalog tables if not exist");

        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS buildings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                alias TEXT NOT NULL DEFAULT '',
                description TEXT NOT NULL DEFAULT ''
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS semantic_keywords (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                keyword TEXT NOT NULL,
                alias TEXT NOT NULL DEFAULT '',
                category TEXT NOT NULL DEFAULT ''
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS intent_keywords (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                phrase TEXT NOT NULL,
                intent_type TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS facilities (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                building_id INTEGER NOT NULL REFERENCES buildings(id),
                name TEXT NOT NULL,
                category TEXT NOT NULL DEFAULT '',
                description TEXT NOT NULL DEFAULT ''
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS facility_keyword_relations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                keyword TEXT NOT NULL,
                facility_id INTEGER NOT NULL REFERENCES facilities(id)
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_fkr_keyword ON facility_keyword_relations(keyword)",
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    // --- listing (table order = match order) ---

    pub async fn buildings(&self) -> Result<Vec<Building>, StorageError> {
        let rows = sqlx::query_as::<_, Building>("SELECT * FROM buildings ORDER BY id")
            .fetch_all(self.pool_manager.pool())
            .await?;
        Ok(rows)
    }

    pub async fn semantic_keywords(&self) -> Result<Vec<SemanticKeyword>, StorageError> {
        let rows =
            sqlx::query_as::<_, SemanticKeyword>("SELECT * FROM semantic_keywords ORDER BY id")
                .fetch_all(self.pool_manager.pool())
                .await?;
        Ok(rows)
    }

    pub async fn intent_keywords(&self) -> Result<Vec<IntentKeyword>, StorageError> {
        let rows = sqlx::query_as::<_, IntentKeyword>("SELECT * FROM intent_keywords ORDER BY id")
            .fetch_all(self.pool_manager.pool())
            .await?;
        Ok(rows)
    }

    // --- point lookups ---

    pub async fn building_by_id(&self, id: i64) -> Result<Option<Building>, StorageError> {
        let row = sqlx::query_as::<_, Building>("SELECT * FROM buildings WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool_manager.pool())
            .await?;
        Ok(row)
    }

    pub async fn semantic_by_keyword(
        &self,
        keyword: &str,
    ) -> Result<Option<SemanticKeyword>, StorageError> {
        let row = sqlx::query_as::<_, SemanticKeyword>(
            "SELECT * FROM semantic_keywords WHERE keyword = ? ORDER BY id LIMIT 1",
        )
        .bind(keyword.trim())
        .fetch_optional(self.pool_manager.pool())
        .await?;
        Ok(row)
    }

    // --- facility retrieval ---

    /// Facilities related to a semantic keyword, in relation-table order.
    /// That order is the canonical pagination order for the retriever.
    pub async fn facilities_by_keyword(
        &self,
        keyword: &str,
    ) -> Result<Vec<Facility>, StorageError> {
        let rows = sqlx::query_as::<_, Facility>(
            r#"
            SELECT f.id, f.building_id, f.name, f.category, f.description
            FROM facility_keyword_relations r
            JOIN facilities f ON f.id = r.facility_id
            WHERE r.keyword = ?
            ORDER BY r.id
            "#,
        )
        .bind(keyword.trim())
        .fetch_all(self.pool_manager.pool())
        .await?;
        Ok(rows)
    }

    pub async fn facilities_by_building(
        &self,
        building_id: i64,
    ) -> Result<Vec<Facility>, StorageError> {
        let rows = sqlx::query_as::<_, Facility>(
            "SELECT * FROM facilities WHERE building_id = ? ORDER BY id",
        )
        .bind(building_id)
        .fetch_all(self.pool_manager.pool())
        .await?;
        Ok(rows)
    }

    /// Resolves ids to facilities, preserving the order of `ids`.
    /// Ids that no longer exist are silently dropped.
    pub async fn facilities_by_ids(&self, ids: &[i64]) -> Result<Vec<Facility>, StorageError> {
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            let row = sqlx::query_as::<_, Facility>("SELECT * FROM facilities WHERE id = ?")
                .bind(id)
                .fetch_optional(self.pool_manager.pool())
                .await?;
            if let Some(f) = row {
                out.push(f);
            }
        }
        Ok(out)
    }

    // --- seeding (admin/tests; the engine never writes the catalog) ---

    pub async fn insert_building(
        &self,
        name: &str,
        alias: &str,
        description: &str,
    ) -> Result<i64, StorageError> {
        let result = sqlx::query("INSERT INTO buildings (name, alias, description) VALUES (?, ?, ?)")
            .bind(name)
            .bind(alias)
            .bind(description)
            .execute(self.pool_manager.pool())
            .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn insert_semantic_keyword(
        &self,
        keyword: &str,
        alias: &str,
        category: &str,
    ) -> Result<i64, StorageError> {
        let result = sqlx::query(
            "INSERT INTO semantic_keywords (keyword, alias, category) VALUES (?, ?, ?)",
        )
        .bind(keyword)
        .bind(alias)
        .bind(category)
        .execute(self.pool_manager.pool())
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn insert_intent_keyword(
        &self,
        phrase: &str,
        intent_type: &str,
    ) -> Result<i64, StorageError> {
        let result = sqlx::query("INSERT INTO intent_keywords (phrase, intent_type) VALUES (?, ?)")
            .bind(phrase)
            .bind(intent_type)
            .execute(self.pool_manager.pool())
            .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn insert_facility(
        &self,
        building_id: i64,
        name: &str,
        category: &str,
        description: &str,
    ) -> Result<i64, StorageError> {
        let result = sqlx::query(
            "INSERT INTO facilities (building_id, name, category, description) VALUES (?, ?, ?, ?)",
        )
        .bind(building_id)
        .bind(name)
        .bind(category)
        .bind(description)
        .execute(self.pool_manager.pool())
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn insert_relation(
        &self,
        keyword: &str,
        facility_id: i64,
    ) -> Result<i64, StorageError> {
        let result = sqlx::query(
            "INSERT INTO facility_keyword_relations (keyword, facility_id) VALUES (?, ?)",
        )
        .bind(keyword)
        .bind(facility_id)
        .execute(self.pool_manager.pool())
        .await?;
        Ok(result.last_insert_rowid())
    }
}
