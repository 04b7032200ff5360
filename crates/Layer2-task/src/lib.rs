//! # gfe-task
//!
//! Thread-backed task handles for data specification generation.
//!
//! Each placed vertex gets an [`AsyncTaskHandle`] that runs its work item on
//! a dedicated thread. Callers block in [`AsyncTaskHandle::wait`] and receive
//! either success or the work item's own error, still pointing at the line
//! that raised it.
//!
//! ## Features
//!
//! - One worker thread per handle, any number of waiters
//! - Failures carry their origin ([`Origin`]) and backtrace
//! - Panics inside work items are reported as failures at the panic site
//! - Shared progress indicator advanced once per successful handle
//! - [`GenerationBatch`] driver with abort-on-first or collect-all policy

pub mod batch;
pub mod error;
pub mod failure;
pub mod handle;
pub mod panic;
pub mod state;
pub mod task;

pub use batch::{BatchReport, GenerationBatch};
pub use error::{MisuseError, Result, TaskError};
pub use failure::{Origin, WorkError, WorkFailure};
pub use handle::{AsyncTaskHandle, WorkItem};
pub use panic::install_origin_hook;
pub use state::TaskOutcome;
pub use task::TaskId;
