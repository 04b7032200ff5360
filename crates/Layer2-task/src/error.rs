//! Task handle errors

use crate::failure::{Origin, WorkFailure};
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, TaskError>;

/// Error surfaced by `start` and `wait`
#[derive(Error, Debug)]
pub enum TaskError {
    /// The work item failed; display and origin are the work item's own
    #[error(transparent)]
    Work(#[from] WorkFailure),

    /// The handle was used out of order
    #[error("Task misuse: {0}")]
    Misuse(#[from] MisuseError),

    /// The worker thread could not be created
    #[error("Failed to spawn worker for {task}: {source}")]
    Spawn {
        task: String,
        #[source]
        source: std::io::Error,
    },
}

impl TaskError {
    pub fn failure(&self) -> Option<&WorkFailure> {
        match self {
            TaskError::Work(failure) => Some(failure),
            TaskError::Misuse(_) | TaskError::Spawn { .. } => None,
        }
    }

    /// Where the work item failed, for `Work` errors
    pub fn origin(&self) -> Option<&Origin> {
        self.failure().map(WorkFailure::origin)
    }

    pub fn is_misuse(&self) -> bool {
        matches!(self, TaskError::Misuse(_))
    }
}

/// Protocol violations on a handle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MisuseError {
    #[error("{task} was already started")]
    AlreadyStarted { task: String },

    #[error("{task} was waited on before being started")]
    NotStarted { task: String },
}
