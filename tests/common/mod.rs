#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use project_planner::{
    DraftService, ExpansionService, FindOrCreate, LocalRecordStore, ModuleDraft, PlannerError,
    Project, ProjectPatch, RecordStore, Result, Stage, SubmoduleRecord, Suggestion, SuggestionSet,
};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub fn todo_project(id: &str) -> Project {
    Project {
        id: id.to_string(),
        name: "Todo".to_string(),
        description: "Build a todo app".to_string(),
        budget: 2500.0,
        duration: 10,
        created_at: Utc::now(),
        generated_data: None,
    }
}

pub fn todo_drafts() -> Vec<ModuleDraft> {
    vec![
        ModuleDraft {
            title: "Auth".to_string(),
            module_name: "auth".to_string(),
            duration: 2,
        },
        ModuleDraft {
            title: "UI".to_string(),
            module_name: "ui".to_string(),
            duration: 3,
        },
    ]
}

pub fn todo_suggestions() -> SuggestionSet {
    SuggestionSet::new(vec![
        Suggestion::new("Auth", "auth", 2, false),
        Suggestion::new("UI", "ui", 3, true),
    ])
}

pub async fn seeded_store(project: Project) -> Arc<LocalRecordStore> {
    let store = LocalRecordStore::in_memory();
    store.put_project(project).await.unwrap();
    Arc::new(store)
}

/// Ordered record of service calls shared between the mock services.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

pub struct ScriptedDraftService {
    log: CallLog,
    responses: Mutex<VecDeque<Result<Vec<ModuleDraft>>>>,
}

impl ScriptedDraftService {
    pub fn new(log: CallLog, responses: Vec<Result<Vec<ModuleDraft>>>) -> Self {
        Self {
            log,
            responses: Mutex::new(responses.into()),
        }
    }
}

#[async_trait]
impl DraftService for ScriptedDraftService {
    async fn refactor(&self, description: &str, duration: u32) -> Result<Vec<ModuleDraft>> {
        self.log.push(format!("draft:{}:{}", description, duration));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PlannerError::service(Stage::Draft, "no scripted response")))
    }
}

pub struct ScriptedExpansionService {
    log: CallLog,
    responses: Mutex<VecDeque<Result<SuggestionSet>>>,
}

impl ScriptedExpansionService {
    pub fn new(log: CallLog, responses: Vec<Result<SuggestionSet>>) -> Self {
        Self {
            log,
            responses: Mutex::new(responses.into()),
        }
    }
}

#[async_trait]
impl ExpansionService for ScriptedExpansionService {
    async fn expand(&self, drafts: &[ModuleDraft], duration: u32) -> Result<SuggestionSet> {
        let titles: Vec<&str> = drafts.iter().map(|d| d.title.as_str()).collect();
        self.log.push(format!("expand:{}:{}", titles.join(","), duration));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PlannerError::service(Stage::Expansion, "no scripted response")))
    }
}

/// Draft service that blocks until the gate is opened.
pub struct GatedDraftService {
    gate: Arc<Notify>,
    drafts: Vec<ModuleDraft>,
}

impl GatedDraftService {
    pub fn new(gate: Arc<Notify>, drafts: Vec<ModuleDraft>) -> Self {
        Self { gate, drafts }
    }
}

#[async_trait]
impl DraftService for GatedDraftService {
    async fn refactor(&self, _description: &str, _duration: u32) -> Result<Vec<ModuleDraft>> {
        self.gate.notified().await;
        Ok(self.drafts.clone())
    }
}

/// Expansion service that blocks until the gate is opened.
pub struct GatedExpansionService {
    gate: Arc<Notify>,
    result: SuggestionSet,
}

impl GatedExpansionService {
    pub fn new(gate: Arc<Notify>, result: SuggestionSet) -> Self {
        Self { gate, result }
    }
}

#[async_trait]
impl ExpansionService for GatedExpansionService {
    async fn expand(&self, _drafts: &[ModuleDraft], _duration: u32) -> Result<SuggestionSet> {
        self.gate.notified().await;
        Ok(self.result.clone())
    }
}

/// Store wrapper that fails selected operations once.
pub struct FlakyStore {
    inner: LocalRecordStore,
    fail_titles: Mutex<HashSet<String>>,
    fail_update: AtomicBool,
    insert_attempts: Mutex<Vec<String>>,
}

impl FlakyStore {
    pub async fn new(project: Project) -> Self {
        let inner = LocalRecordStore::in_memory();
        inner.put_project(project).await.unwrap();
        Self {
            inner,
            fail_titles: Mutex::new(HashSet::new()),
            fail_update: AtomicBool::new(false),
            insert_attempts: Mutex::new(Vec::new()),
        }
    }

    /// The next find-or-create for `process_title` fails.
    pub fn fail_insert_once(&self, process_title: &str) {
        self.fail_titles.lock().unwrap().insert(process_title.to_string());
    }

    pub fn fail_next_update(&self) {
        self.fail_update.store(true, Ordering::SeqCst);
    }

    pub fn insert_attempts(&self) -> Vec<String> {
        self.insert_attempts.lock().unwrap().clone()
    }

    pub async fn submodules(&self) -> Vec<SubmoduleRecord> {
        self.inner.submodules().await
    }
}

#[async_trait]
impl RecordStore for FlakyStore {
    async fn get_project(&self, project_id: &str) -> Result<Project> {
        self.inner.get_project(project_id).await
    }

    async fn update_project(&self, project_id: &str, patch: ProjectPatch) -> Result<()> {
        if self.fail_update.swap(false, Ordering::SeqCst) {
            return Err(PlannerError::store("write rejected"));
        }
        self.inner.update_project(project_id, patch).await
    }

    async fn find_submodule(&self, process_title: &str) -> Result<Option<SubmoduleRecord>> {
        self.inner.find_submodule(process_title).await
    }

    async fn insert_submodule(&self, record: SubmoduleRecord) -> Result<()> {
        self.inner.insert_submodule(record).await
    }

    async fn find_or_create_submodule(&self, record: SubmoduleRecord) -> Result<FindOrCreate> {
        self.insert_attempts
            .lock()
            .unwrap()
            .push(record.process_title.clone());
        if self.fail_titles.lock().unwrap().remove(&record.process_title) {
            return Err(PlannerError::store("connection reset"));
        }
        self.inner.find_or_create_submodule(record).await
    }
}
