pub mod commit;
pub mod orchestrator;
pub mod state;

pub use crate::domain::model::{ModuleDraft, Project, Suggestion, SuggestionSet, SubmoduleRecord};
pub use crate::domain::ports::{DraftService, ExpansionService, RecordStore, RevisionChannel};
pub use crate::utils::error::Result;
