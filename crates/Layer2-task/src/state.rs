//! Task outcome state machine
//!
//! `Pending` moves to exactly one of `Completed` or `Failed`, once.

use crate::failure::WorkFailure;

/// Terminal-or-not outcome of a task handle
#[derive(Debug, Clone)]
pub enum TaskOutcome {
    /// Work has not finished (or not started)
    Pending,

    /// Work returned normally
    Completed,

    /// Work returned an error or panicked
    Failed(WorkFailure),
}

impl TaskOutcome {
    /// Check if this is a terminal state (cannot transition further)
    pub fn is_terminal(&self) -> bool {
        match self {
            TaskOutcome::Pending => false,
            TaskOutcome::Completed | TaskOutcome::Failed(_) => true,
        }
    }

    pub fn is_pending(&self) -> bool {
        !self.is_terminal()
    }

    /// Check if work completed successfully
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Completed)
    }

    pub fn failure(&self) -> Option<&WorkFailure> {
        match self {
            TaskOutcome::Failed(failure) => Some(failure),
            TaskOutcome::Pending | TaskOutcome::Completed => None,
        }
    }

    /// `None` while pending, otherwise the result every waiter receives
    pub fn to_result(&self) -> Option<Result<(), WorkFailure>> {
        match self {
            TaskOutcome::Pending => None,
            TaskOutcome::Completed => Some(Ok(())),
            TaskOutcome::Failed(failure) => Some(Err(failure.clone())),
        }
    }

    /// Get display name for the state
    pub fn display_name(&self) -> &'static str {
        match self {
            TaskOutcome::Pending => "Pending",
            TaskOutcome::Completed => "Completed",
            TaskOutcome::Failed(_) => "Failed",
        }
    }

    /// Get a symbol for the state
    pub fn symbol(&self) -> &'static str {
        match self {
            TaskOutcome::Pending => "◯",
            TaskOutcome::Completed => "✓",
            TaskOutcome::Failed(_) => "✗",
        }
    }
}

impl std::fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
