//! Storage crate: SQLite persistence for the campus chat bot.
//!
//! ## Modules
//!
//! - [`error`] – Storage error types
//! - [`models`] – Building, SemanticKeyword, IntentKeyword, Facility, TurnRecord, Checkpoint
//! - [`catalog_repo`] – CatalogRepository (read-mostly campus lookup tables)
//! - [`turn_log`] – TurnLogRepository (conversation log with session renumbering)
//! - [`sqlite_pool`] – SqlitePoolManager

mod catalog_repo;
mod error;
mod models;
mod sqlite_pool;
mod turn_log;

#[cfg(test)]
mod catalog_repo_test;

pub use catalog_repo::CatalogRepository;
pub use error::StorageError;
pub use models::{
    Building, Checkpoint, Facility, IntentKeyword, IntentType, SemanticKeyword, TurnRecord,
};
pub use sqlite_pool::SqlitePoolManager;
pub use turn_log::TurnLogRepository;
