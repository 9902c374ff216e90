use crate::core::commit::{CommitCoordinator, CommitReport};
use crate::core::state::{PipelineFailure, PipelineState, Stage};
use crate::domain::model::{Project, SuggestionSet};
use crate::domain::ports::{
    DraftService, ExpansionService, ProjectSummary, RecordStore, RevisionChannel, RevisionContext,
};
use crate::utils::error::{PlannerError, Result};
use std::sync::Arc;
use tokio::sync::{watch, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Session {
    project: Option<Project>,
    working: Option<SuggestionSet>,
    last_commit: Option<CommitReport>,
}

/// Drives one project through draft, expansion, review and commit.
///
/// Actions are serialized: a call made while another action holds the
/// session fails with [`PlannerError::Busy`] instead of waiting.
pub struct PipelineOrchestrator<S, D, E>
where
    S: RecordStore,
    D: DraftService,
    E: ExpansionService,
{
    project_id: String,
    store: Arc<S>,
    drafts: D,
    expansion: E,
    committer: CommitCoordinator<S>,
    state: watch::Sender<PipelineState>,
    session: Mutex<Session>,
}

impl<S, D, E> PipelineOrchestrator<S, D, E>
where
    S: RecordStore,
    D: DraftService,
    E: ExpansionService,
{
    pub fn new(project_id: impl Into<String>, store: Arc<S>, drafts: D, expansion: E) -> Self {
        let (state, _) = watch::channel(PipelineState::Idle);
        Self {
            project_id: project_id.into(),
            committer: CommitCoordinator::new(Arc::clone(&store)),
            store,
            drafts,
            expansion,
            state,
            session: Mutex::new(Session::default()),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn state(&self) -> PipelineState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.state.subscribe()
    }

    /// Loaded project, once `initialize` has succeeded.
    pub async fn project(&self) -> Option<Project> {
        self.session.lock().await.project.clone()
    }

    /// Current working suggestion set.
    pub async fn suggestions(&self) -> Option<SuggestionSet> {
        self.session.lock().await.working.clone()
    }

    pub async fn last_commit(&self) -> Option<CommitReport> {
        self.session.lock().await.last_commit.clone()
    }

    /// Loads the project. A project that already carries generated data
    /// resumes straight into review.
    pub async fn initialize(&self) -> Result<PipelineState> {
        let mut session = self.acquire()?;
        self.ensure(self.state().can_initialize(), "initialize")?;

        self.transition(PipelineState::Loading);
        let project = match self.store.get_project(&self.project_id).await {
            Ok(project) => project,
            Err(e) => return Err(self.fail(Stage::Load, e)),
        };

        let next = match &project.generated_data {
            Some(set) => {
                tracing::info!(
                    project_id = %self.project_id,
                    suggestions = set.len(),
                    "Resuming from previously committed suggestions"
                );
                session.working = Some(set.clone());
                PipelineState::Reviewing
            }
            None => PipelineState::Ready,
        };
        session.project = Some(project);
        self.transition(next.clone());
        Ok(next)
    }

    /// Runs the draft service and, on success, the expansion service.
    ///
    /// The two calls form one logical step: a failure in either discards
    /// the drafts, and a retry starts again from the draft call.
    pub async fn start_generation(&self) -> Result<SuggestionSet> {
        let mut session = self.acquire()?;
        self.ensure(self.state().can_start_generation(), "start generation")?;
        let (description, duration) = match &session.project {
            Some(project) => (project.description.clone(), project.duration),
            None => return Err(self.invalid("start generation")),
        };
        session.working = None;

        self.transition(PipelineState::Drafting);
        let drafts = match self.drafts.refactor(&description, duration).await {
            Ok(drafts) => drafts,
            Err(e) => return Err(self.fail(Stage::Draft, as_service_error(Stage::Draft, e))),
        };
        tracing::info!(project_id = %self.project_id, drafts = drafts.len(), "Draft modules received");

        self.transition(PipelineState::Expanding);
        let set = match self.expansion.expand(&drafts, duration).await {
            Ok(set) => set,
            Err(e) => {
                return Err(self.fail(Stage::Expansion, as_service_error(Stage::Expansion, e)))
            }
        };

        session.working = Some(set.clone());
        self.transition(PipelineState::Reviewing);
        Ok(set)
    }

    /// Replaces the working set wholesale. No re-expansion happens.
    ///
    /// Also accepted after a failed commit, returning the pipeline to
    /// review so a set the catalog rejected can be corrected.
    pub async fn apply_revision(&self, set: SuggestionSet) -> Result<()> {
        let mut session = self.acquire()?;
        self.ensure(self.state().can_revise(), "apply revision")?;
        set.check_titles().map_err(|message| self.reject_revision(message))?;
        self.replace_working(&mut session, set);
        Ok(())
    }

    /// Like [`Self::apply_revision`] for an untyped payload, which must be
    /// an object with a `suggestions` list.
    pub async fn apply_revision_value(&self, payload: serde_json::Value) -> Result<()> {
        let mut session = self.acquire()?;
        self.ensure(self.state().can_revise(), "apply revision")?;
        let set = SuggestionSet::from_value(payload).map_err(|message| self.reject_revision(message))?;
        self.replace_working(&mut session, set);
        Ok(())
    }

    pub async fn revision_context(&self) -> Result<RevisionContext> {
        let session = self.acquire()?;
        self.ensure(self.state().can_revise(), "open revision")?;
        match (&session.project, &session.working) {
            (Some(project), Some(set)) => Ok(RevisionContext {
                project: ProjectSummary {
                    name: project.name.clone(),
                    description: project.description.clone(),
                    duration: project.duration,
                },
                suggestions: set.clone(),
                project_id: self.project_id.clone(),
            }),
            _ => Err(self.invalid("open revision")),
        }
    }

    /// Applies every emission from `channel` in order until it reports no
    /// more. Malformed emissions are skipped and the channel is read on;
    /// returns how many revisions were applied.
    pub async fn drain_revisions<C>(&self, channel: &mut C) -> Result<usize>
    where
        C: RevisionChannel + ?Sized,
    {
        let mut applied = 0;
        loop {
            let context = self.revision_context().await?;
            let Some(payload) = channel.next_revision(&context).await? else {
                break;
            };
            match self.apply_revision_value(payload).await {
                Ok(()) => applied += 1,
                Err(PlannerError::InvalidRevision { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(applied)
    }

    /// Commits the working set. On failure the set is kept so `commit`
    /// can be retried without generating again.
    pub async fn commit(&self) -> Result<CommitReport> {
        let mut session = self.acquire()?;
        self.ensure(self.state().can_commit(), "commit")?;
        let Some(set) = session.working.clone() else {
            return Err(self.invalid("commit"));
        };

        self.transition(PipelineState::Committing);
        match self.committer.commit(&self.project_id, &set).await {
            Ok(report) => {
                if let Some(project) = session.project.as_mut() {
                    project.generated_data = Some(set);
                }
                session.last_commit = Some(report.clone());
                self.transition(PipelineState::Done);
                Ok(report)
            }
            Err(e) => Err(self.fail(Stage::Commit, e)),
        }
    }

    /// Discards the working set and returns to `Ready` so generation can
    /// run again. Persisted data is untouched.
    pub async fn reset(&self) -> Result<()> {
        let mut session = self.acquire()?;
        self.ensure(self.state().can_reset(), "reset")?;
        session.working = None;
        self.transition(PipelineState::Ready);
        Ok(())
    }

    fn acquire(&self) -> Result<MutexGuard<'_, Session>> {
        self.session.try_lock().map_err(|_| {
            tracing::warn!(project_id = %self.project_id, "Rejected overlapping pipeline action");
            PlannerError::Busy {
                project_id: self.project_id.clone(),
            }
        })
    }

    fn ensure(&self, allowed: bool, operation: &'static str) -> Result<()> {
        if allowed {
            Ok(())
        } else {
            Err(self.invalid(operation))
        }
    }

    fn invalid(&self, operation: &'static str) -> PlannerError {
        PlannerError::InvalidTransition {
            operation,
            state: self.state().to_string(),
        }
    }

    fn reject_revision(&self, message: String) -> PlannerError {
        tracing::warn!(project_id = %self.project_id, %message, "Rejected revision");
        PlannerError::InvalidRevision { message }
    }

    fn replace_working(&self, session: &mut Session, set: SuggestionSet) {
        tracing::info!(
            project_id = %self.project_id,
            suggestions = set.len(),
            "Applied revision"
        );
        session.working = Some(set);
        if self.state() != PipelineState::Reviewing {
            self.transition(PipelineState::Reviewing);
        }
    }

    fn transition(&self, next: PipelineState) {
        let previous = self.state.send_replace(next.clone());
        tracing::info!(
            project_id = %self.project_id,
            from = %previous,
            to = %next,
            "Pipeline transition"
        );
    }

    fn fail(&self, stage: Stage, error: PlannerError) -> PlannerError {
        tracing::error!(
            project_id = %self.project_id,
            %stage,
            kind = ?error.kind(),
            error = %error,
            "Pipeline stage failed"
        );
        self.transition(PipelineState::Failed(PipelineFailure::new(stage, &error)));
        error
    }
}

fn as_service_error(stage: Stage, error: PlannerError) -> PlannerError {
    match error {
        PlannerError::ServiceError { message, .. } => PlannerError::ServiceError { stage, message },
        other => PlannerError::service(stage, other.to_string()),
    }
}
