use crate::domain::model::{ProjectPatch, SubmoduleRecord, SuggestionSet};
use crate::domain::ports::{FindOrCreate, RecordStore};
use crate::utils::error::{PlannerError, Result};
use crate::utils::validation::Validate;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;

/// Per-module outcome of a successful commit, keyed by process title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub inserted: Vec<String>,
    /// Find-or-create hits: the catalog already held the key.
    pub already_present: Vec<String>,
    /// Suggestions flagged `exists` that were never looked up.
    pub skipped: Vec<String>,
    /// Later suggestions whose title normalizes to a key seen earlier in the set.
    pub duplicates: Vec<String>,
}

impl CommitReport {
    pub fn succeeded(&self) -> Vec<String> {
        self.inserted
            .iter()
            .chain(self.already_present.iter())
            .cloned()
            .collect()
    }
}

/// Persists a finalized suggestion set onto the project and into the catalog.
///
/// Committing the same set any number of times leaves the same catalog
/// contents: every insert goes through the store's atomic find-or-create.
pub struct CommitCoordinator<S: RecordStore> {
    store: Arc<S>,
}

impl<S: RecordStore> CommitCoordinator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn commit(&self, project_id: &str, set: &SuggestionSet) -> Result<CommitReport> {
        tracing::info!(
            project_id,
            suggestions = set.len(),
            "Committing suggestion set"
        );

        set.validate()?;

        self.store
            .update_project(project_id, ProjectPatch::generated_data(set.clone()))
            .await?;

        let mut report = CommitReport::default();
        let mut failed = Vec::new();
        let mut seen = HashSet::new();
        let created_at = Utc::now();

        for suggestion in &set.suggestions {
            let key = suggestion.process_title();

            if suggestion.exists {
                tracing::debug!(process_title = %key, "Skipping module flagged as existing");
                report.skipped.push(key);
                continue;
            }

            if !seen.insert(key.clone()) {
                tracing::debug!(process_title = %key, "Duplicate title within set");
                report.duplicates.push(key);
                continue;
            }

            let record = SubmoduleRecord::from_suggestion(suggestion, created_at);
            match self.store.find_or_create_submodule(record).await {
                Ok(FindOrCreate::Created) => {
                    tracing::debug!(process_title = %key, "Inserted submodule");
                    report.inserted.push(key);
                }
                Ok(FindOrCreate::Existing(_)) => {
                    tracing::debug!(process_title = %key, "Submodule already in catalog");
                    report.already_present.push(key);
                }
                Err(e) => {
                    tracing::warn!(process_title = %key, error = %e, "Submodule insert failed");
                    failed.push(key);
                }
            }
        }

        if !failed.is_empty() {
            return Err(PlannerError::PartialCommit {
                succeeded: report.succeeded(),
                failed,
            });
        }

        tracing::info!(
            project_id,
            inserted = report.inserted.len(),
            already_present = report.already_present.len(),
            skipped = report.skipped.len(),
            duplicates = report.duplicates.len(),
            "Commit complete"
        );
        Ok(report)
    }
}
