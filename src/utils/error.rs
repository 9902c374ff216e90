use crate::core::state::Stage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("Project not found: {project_id}")]
    NotFound { project_id: String },

    #[error("{stage} service failed: {message}")]
    ServiceError { stage: Stage, message: String },

    #[error("Record store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("Another pipeline action is already in flight for project {project_id}")]
    Busy { project_id: String },

    #[error(
        "Commit incomplete: {} module(s) committed, {} failed ({})",
        .succeeded.len(),
        .failed.len(),
        .failed.join(", ")
    )]
    PartialCommit {
        succeeded: Vec<String>,
        failed: Vec<String>,
    },

    #[error("Invalid revision payload: {message}")]
    InvalidRevision { message: String },

    #[error("Cannot {operation} while pipeline is {state}")]
    InvalidTransition { operation: &'static str, state: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration value for '{field}': {reason} (got '{value}')")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Cloneable discriminant of [`PlannerError`], carried by failed pipeline states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    NotFound,
    ServiceError,
    StoreUnavailable,
    Busy,
    PartialCommit,
    InvalidRevision,
    InvalidTransition,
    Config,
    Validation,
    Io,
    Serialization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Lookup,
    Generation,
    Persistence,
    Concurrency,
    Input,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PlannerError {
    pub fn service(stage: Stage, message: impl Into<String>) -> Self {
        PlannerError::ServiceError {
            stage,
            message: message.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        PlannerError::StoreUnavailable {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PlannerError::NotFound { .. } => ErrorKind::NotFound,
            PlannerError::ServiceError { .. } => ErrorKind::ServiceError,
            PlannerError::StoreUnavailable { .. } => ErrorKind::StoreUnavailable,
            PlannerError::Busy { .. } => ErrorKind::Busy,
            PlannerError::PartialCommit { .. } => ErrorKind::PartialCommit,
            PlannerError::InvalidRevision { .. } => ErrorKind::InvalidRevision,
            PlannerError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            PlannerError::ConfigError { .. } | PlannerError::InvalidConfigValueError { .. } => {
                ErrorKind::Config
            }
            PlannerError::ValidationError { .. } => ErrorKind::Validation,
            PlannerError::IoError(_) => ErrorKind::Io,
            PlannerError::SerializationError(_) => ErrorKind::Serialization,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self.kind() {
            ErrorKind::NotFound => ErrorCategory::Lookup,
            ErrorKind::ServiceError => ErrorCategory::Generation,
            ErrorKind::StoreUnavailable | ErrorKind::PartialCommit => ErrorCategory::Persistence,
            ErrorKind::Busy | ErrorKind::InvalidTransition => ErrorCategory::Concurrency,
            ErrorKind::InvalidRevision | ErrorKind::Validation => ErrorCategory::Input,
            ErrorKind::Config => ErrorCategory::Configuration,
            ErrorKind::Io | ErrorKind::Serialization => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.kind() {
            ErrorKind::Busy => ErrorSeverity::Low,
            ErrorKind::ServiceError | ErrorKind::StoreUnavailable | ErrorKind::PartialCommit => {
                ErrorSeverity::Medium
            }
            ErrorKind::NotFound
            | ErrorKind::InvalidRevision
            | ErrorKind::InvalidTransition
            | ErrorKind::Validation
            | ErrorKind::Config => ErrorSeverity::High,
            ErrorKind::Io | ErrorKind::Serialization => ErrorSeverity::Critical,
        }
    }

    /// Whether re-invoking the same action may succeed without other changes.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::ServiceError
                | ErrorKind::StoreUnavailable
                | ErrorKind::PartialCommit
                | ErrorKind::Busy
        )
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            PlannerError::NotFound { .. } => "Check the project id and the configured store path".to_string(),
            PlannerError::ServiceError { stage, .. } => {
                format!("The {} service failed; run generation again to restart from the draft step", stage)
            }
            PlannerError::StoreUnavailable { .. } => "Verify the record store is reachable and writable, then retry".to_string(),
            PlannerError::Busy { .. } => "Wait for the current action to finish before starting another".to_string(),
            PlannerError::PartialCommit { .. } => {
                "Retry the commit; modules already in the catalog will not be inserted again".to_string()
            }
            PlannerError::InvalidRevision { .. } => {
                "The revision must be an object with a 'suggestions' array".to_string()
            }
            PlannerError::InvalidTransition { .. } => "Check the pipeline state before issuing this action".to_string(),
            PlannerError::ConfigError { .. } | PlannerError::InvalidConfigValueError { .. } => {
                "Fix the configuration file and try again".to_string()
            }
            PlannerError::ValidationError { .. } => "Correct the input data and try again".to_string(),
            PlannerError::IoError(_) => "Check file permissions and available disk space".to_string(),
            PlannerError::SerializationError(_) => "Check that stored documents are valid JSON".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            PlannerError::NotFound { project_id } => format!("Project '{}' was not found", project_id),
            PlannerError::ServiceError { stage, .. } => format!("Plan generation failed during {}", stage),
            PlannerError::PartialCommit { succeeded, failed } => format!(
                "Saved {} module(s) but {} could not be saved",
                succeeded.len(),
                failed.len()
            ),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlannerError>;
