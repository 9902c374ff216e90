use crate::utils::error::{ErrorKind, PlannerError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline stage that can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Load,
    Draft,
    Expansion,
    Commit,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Draft => "draft",
            Stage::Expansion => "expansion",
            Stage::Commit => "commit",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineFailure {
    pub stage: Stage,
    pub kind: ErrorKind,
    pub message: String,
}

impl PipelineFailure {
    pub fn new(stage: Stage, error: &PlannerError) -> Self {
        Self {
            stage,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// ```text
/// Idle -> Loading -> Ready -> Drafting -> Expanding -> Reviewing -> Committing -> Done
///                 \-> Reviewing (project already carries generated data)
/// Loading | Drafting | Expanding | Committing -> Failed(stage)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum PipelineState {
    Idle,
    Loading,
    Ready,
    Drafting,
    Expanding,
    Reviewing,
    Committing,
    Done,
    Failed(PipelineFailure),
}

impl PipelineState {
    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            PipelineState::Failed(failure) => Some(failure.stage),
            _ => None,
        }
    }

    pub fn can_initialize(&self) -> bool {
        matches!(self, PipelineState::Idle) || self.failed_stage() == Some(Stage::Load)
    }

    pub fn can_start_generation(&self) -> bool {
        matches!(self, PipelineState::Ready)
            || matches!(self.failed_stage(), Some(Stage::Draft | Stage::Expansion))
    }

    /// Revisions are accepted in review and after a failed commit.
    pub fn can_revise(&self) -> bool {
        matches!(self, PipelineState::Reviewing) || self.failed_stage() == Some(Stage::Commit)
    }

    pub fn can_commit(&self) -> bool {
        matches!(self, PipelineState::Reviewing) || self.failed_stage() == Some(Stage::Commit)
    }

    pub fn can_reset(&self) -> bool {
        match self {
            PipelineState::Reviewing | PipelineState::Done => true,
            PipelineState::Failed(failure) => failure.stage != Stage::Load,
            _ => false,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Idle => f.write_str("idle"),
            PipelineState::Loading => f.write_str("loading"),
            PipelineState::Ready => f.write_str("ready"),
            PipelineState::Drafting => f.write_str("drafting"),
            PipelineState::Expanding => f.write_str("expanding"),
            PipelineState::Reviewing => f.write_str("reviewing"),
            PipelineState::Committing => f.write_str("committing"),
            PipelineState::Done => f.write_str("done"),
            PipelineState::Failed(failure) => write!(f, "failed({})", failure.stage),
        }
    }
}
