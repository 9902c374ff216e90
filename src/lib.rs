pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;

pub use adapters::{
    FileRevisionChannel, HttpDraftService, HttpExpansionService, LocalRecordStore,
    StreamRevisionChannel,
};
pub use config::PlannerConfig;
pub use core::commit::{CommitCoordinator, CommitReport};
pub use core::orchestrator::PipelineOrchestrator;
pub use core::state::{PipelineFailure, PipelineState, Stage};
pub use domain::model::{
    process_title, ModuleDraft, Project, ProjectPatch, SubmoduleRecord, Suggestion, SuggestionSet,
};
pub use domain::ports::{
    DraftService, ExpansionService, FindOrCreate, RecordStore, RevisionChannel, RevisionContext,
};
pub use utils::error::{ErrorKind, PlannerError, Result};
