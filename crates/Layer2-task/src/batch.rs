//! Generation batch - one handle per placement
//!
//! Starts every handle, then waits on them in insertion order. What happens
//! on a failure is decided by the [`FailurePolicy`]; handles that are still
//! running when the batch stops early keep running, there is no
//! cancellation.

use crate::error::{Result, TaskError};
use crate::failure::{WorkError, WorkFailure};
use crate::handle::{AsyncTaskHandle, WorkItem};
use gfe_foundation::{FailurePolicy, GfeConfig, Progress, TaskConfig};
use std::fmt::Display;
use std::sync::Arc;
use tracing::{info, warn};

/// Outcomes collected by [`GenerationBatch::run`]
#[derive(Debug, Clone)]
pub struct BatchReport<C> {
    /// Contexts whose work completed, in insertion order
    pub completed: Vec<C>,

    /// Contexts whose work failed, in insertion order
    pub failed: Vec<(C, WorkFailure)>,
}

impl<C> BatchReport<C> {
    fn new() -> Self {
        Self {
            completed: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.completed.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn first_failure(&self) -> Option<&(C, WorkFailure)> {
        self.failed.first()
    }

    /// Completed contexts, or the first failure as an error
    pub fn into_result(self) -> Result<Vec<C>> {
        match self.failed.into_iter().next() {
            Some((_, failure)) => Err(TaskError::Work(failure)),
            None => Ok(self.completed),
        }
    }
}

/// A set of work items sharing one progress indicator
pub struct GenerationBatch<C> {
    progress: Arc<dyn Progress>,
    task_config: TaskConfig,
    policy: FailurePolicy,
    entries: Vec<(C, WorkItem)>,
}

impl<C> GenerationBatch<C>
where
    C: Display + Clone + Send + Sync + 'static,
{
    pub fn new(progress: Arc<dyn Progress>) -> Self {
        Self {
            progress,
            task_config: TaskConfig::default(),
            policy: FailurePolicy::default(),
            entries: Vec::new(),
        }
    }

    /// Batch using the task and batch sections of a loaded config
    pub fn from_config(progress: Arc<dyn Progress>, config: &GfeConfig) -> Self {
        Self::new(progress)
            .with_task_config(config.task.clone())
            .with_policy(config.batch.failure_policy)
    }

    pub fn with_task_config(mut self, config: TaskConfig) -> Self {
        self.task_config = config;
        self
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Queue a work item for `context`
    pub fn add<F>(&mut self, context: C, work: F) -> &mut Self
    where
        F: FnOnce() -> std::result::Result<(), WorkError> + Send + 'static,
    {
        self.entries.push((context, Box::new(work)));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Create the handles without starting them
    pub fn into_handles(self) -> Vec<AsyncTaskHandle<C>> {
        let progress = self.progress;
        let config = self.task_config;
        self.entries
            .into_iter()
            .map(|(context, work)| {
                AsyncTaskHandle::with_config(context, Arc::clone(&progress), config.clone(), work)
            })
            .collect()
    }

    /// Start every handle, then wait on each in order
    pub fn run(self) -> Result<BatchReport<C>> {
        let policy = self.policy;
        let handles = self.into_handles();
        info!("Generating {} data specs ({})", handles.len(), policy);

        for handle in &handles {
            if let Err(e) = handle.start() {
                let collect =
                    policy == FailurePolicy::CollectAll && matches!(e, TaskError::Spawn { .. });
                if !collect {
                    return Err(e);
                }
                // The handle is already marked failed; its wait reports it.
                warn!("{}", e);
            }
        }

        let mut report = BatchReport::new();
        for handle in &handles {
            match handle.wait() {
                Ok(()) => report.completed.push(handle.context().clone()),
                Err(TaskError::Work(failure)) => match policy {
                    FailurePolicy::AbortOnFirstFailure => {
                        warn!("Aborting batch: {} failed at {}", handle, failure.origin());
                        return Err(TaskError::Work(failure));
                    }
                    FailurePolicy::CollectAll => {
                        report.failed.push((handle.context().clone(), failure));
                    }
                },
                Err(e) => return Err(e),
            }
        }

        if report.is_success() {
            info!("Generated {} data specs", report.completed.len());
        } else {
            warn!(
                "Generated {} of {} data specs, {} failed",
                report.completed.len(),
                report.total(),
                report.failed.len()
            );
        }

        Ok(report)
    }
}
