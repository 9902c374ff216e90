use crate::domain::model::{ModuleDraft, Project, ProjectPatch, SubmoduleRecord, SuggestionSet};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Outcome of an atomic find-or-create against the submodule catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum FindOrCreate {
    Created,
    Existing(SubmoduleRecord),
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fails with `NotFound` when no project has this id.
    async fn get_project(&self, project_id: &str) -> Result<Project>;
    async fn update_project(&self, project_id: &str, patch: ProjectPatch) -> Result<()>;
    async fn find_submodule(&self, process_title: &str) -> Result<Option<SubmoduleRecord>>;
    /// Unconditional append to the catalog.
    async fn insert_submodule(&self, record: SubmoduleRecord) -> Result<()>;
    /// Inserts `record` only if no record with its `process_title` exists.
    /// The lookup and the insert must be a single atomic step.
    async fn find_or_create_submodule(&self, record: SubmoduleRecord) -> Result<FindOrCreate>;
}

#[async_trait]
pub trait DraftService: Send + Sync {
    async fn refactor(&self, description: &str, duration: u32) -> Result<Vec<ModuleDraft>>;
}

#[async_trait]
pub trait ExpansionService: Send + Sync {
    async fn expand(&self, drafts: &[ModuleDraft], duration: u32) -> Result<SuggestionSet>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub name: String,
    pub description: String,
    pub duration: u32,
}

/// What the revision surface is shown for each round of human edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionContext {
    pub project: ProjectSummary,
    pub suggestions: SuggestionSet,
    pub project_id: String,
}

#[async_trait]
pub trait RevisionChannel: Send {
    /// Next revised payload, or `None` once the human is done editing.
    /// Payloads are untyped and validated by the orchestrator.
    async fn next_revision(&mut self, context: &RevisionContext) -> Result<Option<serde_json::Value>>;
}
