//! Campus building row.
//!
//! Maps to the `buildings` table; read-only at request time.

use serde::{Deserialize, Serialize};

/// A campus building with its canonical name and ordered alias list.
///
/// The alias column is comma-separated; by data-entry convention the
/// leading entries are building-level names and later entries denote
/// facilities inside the building (the split index is the matcher's
/// alias threshold, not fixed here).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Building {
    pub id: i64,
    pub name: String,
    pub alias: String,
    /// Free text; may embed floor tokens such as "3층" or "B1층".
    pub description: String,
}

impl Building {
    /// Aliases in stored order, trimmed, empty entries dropped.
    pub fn aliases(&self) -> Vec<&str> {
        self.alias
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .collect()
    }

    /// First alias token, used as the short display name in facility lists.
    pub fn first_alias(&self) -> &str {
        self.aliases().first().copied().unwrap_or(&self.name)
    }
}
