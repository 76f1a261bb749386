//! Storage models: campus catalog rows and conversation log records.

mod building;
mod facility;
mod keyword;
mod turn_record;

pub use building::Building;
pub use facility::Facility;
pub use keyword::{IntentKeyword, IntentType, SemanticKeyword};
pub use turn_record::{Checkpoint, TurnRecord};
