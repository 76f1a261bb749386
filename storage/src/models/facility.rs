//! Facility row: a named space owned by exactly one building.

use serde::{Deserialize, Serialize};

/// A facility inside a building. The stable integer id is the unit of
/// pagination and exclusion tracking across turns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Facility {
    pub id: i64,
    pub building_id: i64,
    pub name: String,
    pub category: String,
    /// Free text; may embed a floor token ("2층", "B1층").
    pub description: String,
}
