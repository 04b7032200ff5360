//! Async task handle
//!
//! Runs one work item on its own thread and hands the outcome to any number
//! of waiters. The outcome lives behind a mutex together with the lifecycle
//! stage; the worker writes it once and wakes every parked waiter with
//! `notify_all`. Waiters check the outcome before parking and again after
//! every wake-up.

use crate::error::{MisuseError, Result, TaskError};
use crate::failure::{WorkError, WorkFailure};
use crate::panic::run_caught;
use crate::state::TaskOutcome;
use crate::task::TaskId;
use chrono::{DateTime, Utc};
use gfe_foundation::{Progress, TaskConfig};
use parking_lot::{Condvar, Mutex};
use std::fmt::{self, Display};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Work run by a handle's worker thread
pub type WorkItem = Box<dyn FnOnce() -> std::result::Result<(), WorkError> + Send + 'static>;

enum Stage {
    /// Not started yet; holds the work to run
    Idle(WorkItem),
    Started,
}

struct Slot {
    stage: Stage,
    outcome: TaskOutcome,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

struct Inner<C> {
    id: TaskId,
    context: C,
    config: TaskConfig,
    progress: Arc<dyn Progress>,
    slot: Mutex<Slot>,
    finished: Condvar,
}

impl<C: Display> Inner<C> {
    /// Run the work, then advance progress on success.
    ///
    /// A panicking `advance` is recorded as a failure so waiters still wake,
    /// but the indicator may already have counted the step.
    fn run(&self, work: WorkItem) {
        let result = run_caught(work).and_then(|()| {
            run_caught(|| {
                self.progress.advance();
                Ok(())
            })
        });

        match result {
            Ok(()) => {
                debug!("{} ({}) completed", self, self.id);
                self.finish(TaskOutcome::Completed);
            }
            Err(error) => {
                let failure = WorkFailure::from(error);
                warn!(
                    "{} ({}) failed at {}: {}",
                    self,
                    self.id,
                    failure.origin(),
                    failure
                );
                self.finish(TaskOutcome::Failed(failure));
            }
        }
    }

    fn finish(&self, outcome: TaskOutcome) {
        let mut slot = self.slot.lock();
        if slot.outcome.is_terminal() {
            warn!("{} ({}) already finished, ignoring {}", self, self.id, outcome);
            return;
        }
        slot.outcome = outcome;
        slot.finished_at = Some(Utc::now());
        self.finished.notify_all();
    }
}

impl<C: Display> Display for Inner<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dsg for {}", self.context)
    }
}

/// Handle to one unit of work running on its own thread.
///
/// Clones share the same task, so several threads can [`wait`](Self::wait)
/// on it. The worker thread is detached and exits once the work returns.
pub struct AsyncTaskHandle<C> {
    inner: Arc<Inner<C>>,
}

impl<C> Clone for AsyncTaskHandle<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> AsyncTaskHandle<C>
where
    C: Display + Send + Sync + 'static,
{
    /// Create a handle with the default task configuration
    pub fn new<F>(context: C, progress: Arc<dyn Progress>, work: F) -> Self
    where
        F: FnOnce() -> std::result::Result<(), WorkError> + Send + 'static,
    {
        Self::with_config(context, progress, TaskConfig::default(), work)
    }

    /// Create a handle with an explicit task configuration
    pub fn with_config<F>(
        context: C,
        progress: Arc<dyn Progress>,
        config: TaskConfig,
        work: F,
    ) -> Self
    where
        F: FnOnce() -> std::result::Result<(), WorkError> + Send + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                id: TaskId::new(),
                context,
                config,
                progress,
                slot: Mutex::new(Slot {
                    stage: Stage::Idle(Box::new(work)),
                    outcome: TaskOutcome::Pending,
                    started_at: None,
                    finished_at: None,
                }),
                finished: Condvar::new(),
            }),
        }
    }

    /// Spawn the worker thread. Returns without waiting for the work.
    ///
    /// A second call fails with [`MisuseError::AlreadyStarted`]. If the thread
    /// cannot be spawned the handle is marked failed so waiters do not block
    /// forever, and [`TaskError::Spawn`] is returned.
    pub fn start(&self) -> Result<()> {
        let work = {
            let mut slot = self.inner.slot.lock();
            match std::mem::replace(&mut slot.stage, Stage::Started) {
                Stage::Idle(work) => {
                    slot.started_at = Some(Utc::now());
                    work
                }
                Stage::Started => {
                    warn!("{} ({}) started twice", self, self.inner.id);
                    return Err(MisuseError::AlreadyStarted {
                        task: self.to_string(),
                    }
                    .into());
                }
            }
        };

        let mut builder = thread::Builder::new().name(format!(
            "{}-{}",
            self.inner.config.thread_name_prefix, self.inner.id
        ));
        if let Some(stack_size) = self.inner.config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        debug!("Starting {} ({})", self, self.inner.id);

        let inner = Arc::clone(&self.inner);
        match builder.spawn(move || inner.run(work)) {
            Ok(_) => Ok(()),
            Err(source) => {
                let error = WorkError::msg(format!("failed to spawn worker thread: {}", source));
                self.inner.finish(TaskOutcome::Failed(error.into()));
                Err(TaskError::Spawn {
                    task: self.to_string(),
                    source,
                })
            }
        }
    }

    /// Block until the work has finished.
    ///
    /// Every call, from any thread, sees the same outcome: `Ok(())` once the
    /// work completed, or [`TaskError::Work`] carrying the recorded failure
    /// with its original origin. Waiting before [`start`](Self::start) fails
    /// with [`MisuseError::NotStarted`].
    pub fn wait(&self) -> Result<()> {
        let mut slot = self.inner.slot.lock();
        if let Stage::Idle(_) = slot.stage {
            warn!("{} ({}) waited on before start", self, self.inner.id);
            return Err(MisuseError::NotStarted {
                task: self.to_string(),
            }
            .into());
        }

        loop {
            if let Some(result) = slot.outcome.to_result() {
                return result.map_err(TaskError::Work);
            }
            self.inner.finished.wait(&mut slot);
        }
    }

    /// Snapshot of the current outcome
    pub fn outcome(&self) -> TaskOutcome {
        self.inner.slot.lock().outcome.clone()
    }

    pub fn is_started(&self) -> bool {
        matches!(self.inner.slot.lock().stage, Stage::Started)
    }

    pub fn is_finished(&self) -> bool {
        self.inner.slot.lock().outcome.is_terminal()
    }

    pub fn id(&self) -> TaskId {
        self.inner.id
    }

    pub fn context(&self) -> &C {
        &self.inner.context
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.inner.slot.lock().started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.inner.slot.lock().finished_at
    }

    /// Time from start to finish, or to now while still running
    pub fn duration(&self) -> Option<Duration> {
        let slot = self.inner.slot.lock();
        let start = slot.started_at?;
        let end = slot.finished_at.unwrap_or_else(Utc::now);
        Some((end - start).to_std().unwrap_or_default())
    }
}

impl<C: Display> Display for AsyncTaskHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&*self.inner, f)
    }
}

impl<C: Display> fmt::Debug for AsyncTaskHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.inner.slot.lock();
        f.debug_struct("AsyncTaskHandle")
            .field("id", &self.inner.id)
            .field("context", &format_args!("{}", self.inner.context))
            .field("started", &matches!(slot.stage, Stage::Started))
            .field("outcome", &slot.outcome)
            .finish()
    }
}
