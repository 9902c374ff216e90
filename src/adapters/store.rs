use crate::core::RecordStore;
use crate::domain::model::{Project, ProjectPatch, SubmoduleRecord};
use crate::domain::ports::FindOrCreate;
use crate::utils::error::{PlannerError, Result};
use crate::utils::validation::validate_non_negative;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Documents {
    #[serde(default)]
    projects: BTreeMap<String, Project>,
    #[serde(default)]
    submodules: Vec<SubmoduleRecord>,
}

/// Document store held in memory, optionally mirrored to a JSON file.
///
/// Every operation runs under one lock, so find-or-create is a single
/// check-then-insert step. Mutations are applied to a copy and only become
/// visible once the file write succeeded.
#[derive(Debug)]
pub struct LocalRecordStore {
    path: Option<PathBuf>,
    documents: Mutex<Documents>,
}

impl LocalRecordStore {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            documents: Mutex::new(Documents::default()),
        }
    }

    /// Opens the store file at `path`, starting empty if it does not exist yet.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let documents = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let documents: Documents = serde_json::from_slice(&bytes).map_err(|e| {
                    PlannerError::store(format!("{} is not a valid store file: {}", path.display(), e))
                })?;
                for project in documents.projects.values() {
                    validate_non_negative("budget", project.budget)?;
                }
                documents
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("Store file {} not found, starting empty", path.display());
                Documents::default()
            }
            Err(e) => {
                return Err(PlannerError::store(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        tracing::debug!(
            projects = documents.projects.len(),
            submodules = documents.submodules.len(),
            "Opened record store {}",
            path.display()
        );
        Ok(Self {
            path: Some(path),
            documents: Mutex::new(documents),
        })
    }

    pub async fn put_project(&self, project: Project) -> Result<()> {
        validate_non_negative("budget", project.budget)?;
        self.mutate(|docs| {
            docs.projects.insert(project.id.clone(), project);
            Ok(())
        })
        .await
    }

    pub async fn submodules(&self) -> Vec<SubmoduleRecord> {
        self.documents.lock().await.submodules.clone()
    }

    async fn mutate<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Documents) -> Result<T>,
    {
        let mut current = self.documents.lock().await;
        let mut next = current.clone();
        let value = f(&mut next)?;
        self.persist(&next).await?;
        *current = next;
        Ok(value)
    }

    async fn persist(&self, documents: &Documents) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let data = serde_json::to_vec_pretty(documents)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PlannerError::store(format!("failed to create {}: {}", parent.display(), e)))?;
        }

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &data)
            .await
            .map_err(|e| PlannerError::store(format!("failed to write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| PlannerError::store(format!("failed to replace {}: {}", path.display(), e)))?;

        tracing::debug!("Wrote {} bytes to {}", data.len(), path.display());
        Ok(())
    }
}

#[async_trait]
impl RecordStore for LocalRecordStore {
    async fn get_project(&self, project_id: &str) -> Result<Project> {
        let documents = self.documents.lock().await;
        documents
            .projects
            .get(project_id)
            .cloned()
            .ok_or_else(|| PlannerError::NotFound {
                project_id: project_id.to_string(),
            })
    }

    async fn update_project(&self, project_id: &str, patch: ProjectPatch) -> Result<()> {
        self.mutate(|docs| {
            let project = docs
                .projects
                .get_mut(project_id)
                .ok_or_else(|| PlannerError::NotFound {
                    project_id: project_id.to_string(),
                })?;
            patch.apply_to(project);
            Ok(())
        })
        .await
    }

    async fn find_submodule(&self, process_title: &str) -> Result<Option<SubmoduleRecord>> {
        let documents = self.documents.lock().await;
        Ok(documents
            .submodules
            .iter()
            .find(|r| r.process_title == process_title)
            .cloned())
    }

    async fn insert_submodule(&self, record: SubmoduleRecord) -> Result<()> {
        self.mutate(|docs| {
            docs.submodules.push(record);
            Ok(())
        })
        .await
    }

    async fn find_or_create_submodule(&self, record: SubmoduleRecord) -> Result<FindOrCreate> {
        self.mutate(|docs| {
            if let Some(existing) = docs
                .submodules
                .iter()
                .find(|r| r.process_title == record.process_title)
            {
                return Ok(FindOrCreate::Existing(existing.clone()));
            }
            docs.submodules.push(record);
            Ok(FindOrCreate::Created)
        })
        .await
    }
}
