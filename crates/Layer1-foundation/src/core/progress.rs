//! Progress indicator contract
//!
//! A compilation pass shares one indicator between every worker thread, so
//! `advance` must be safe to call concurrently.

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// Something that can be moved forward by one step from any thread
pub trait Progress: Send + Sync {
    /// Count one finished step. Must not panic.
    fn advance(&self);
}

/// Atomic step counter with an optional expected total
#[derive(Debug)]
pub struct ProgressCounter {
    label: String,
    total: Option<u64>,
    done: AtomicU64,
}

impl ProgressCounter {
    /// Counter expecting `total` steps
    pub fn new(label: impl Into<String>, total: u64) -> Self {
        Self {
            label: label.into(),
            total: Some(total),
            done: AtomicU64::new(0),
        }
    }

    /// Counter without a known total
    pub fn unbounded(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            total: None,
            done: AtomicU64::new(0),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Steps taken so far
    pub fn count(&self) -> u64 {
        self.done.load(Ordering::Acquire)
    }

    /// Completed fraction in `0.0..=1.0`, `None` without a total
    pub fn fraction(&self) -> Option<f64> {
        match self.total {
            Some(0) => Some(1.0),
            Some(total) => Some((self.count() as f64 / total as f64).min(1.0)),
            None => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.total.is_some_and(|total| self.count() >= total)
    }
}

impl Progress for ProgressCounter {
    fn advance(&self) {
        let done = self.done.fetch_add(1, Ordering::AcqRel) + 1;
        match self.total {
            Some(total) if done == total => info!("{}: {}/{} done", self.label, done, total),
            Some(total) => debug!("{}: {}/{}", self.label, done, total),
            None => debug!("{}: {}", self.label, done),
        }
    }
}
