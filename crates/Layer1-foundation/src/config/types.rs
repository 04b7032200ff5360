//! Configuration types

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default worker thread name prefix
pub const DEFAULT_THREAD_PREFIX: &str = "dsg";

/// Settings applied to every task handle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    /// Worker threads are named `{prefix}-{task id}`
    pub thread_name_prefix: String,

    /// Worker stack size in bytes; platform default when unset
    pub stack_size: Option<usize>,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            thread_name_prefix: DEFAULT_THREAD_PREFIX.to_string(),
            stack_size: None,
        }
    }
}

impl TaskConfig {
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.thread_name_prefix.trim().is_empty() {
            return Err(Error::Config(
                "task.thread_name_prefix must not be empty".to_string(),
            ));
        }
        if self.stack_size == Some(0) {
            return Err(Error::Config("task.stack_size must be positive".to_string()));
        }
        Ok(())
    }
}

/// What a batch does when one of its handles fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop waiting at the first failure and report it
    AbortOnFirstFailure,

    /// Wait for every handle and report all outcomes
    #[default]
    CollectAll,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::AbortOnFirstFailure => "abort_on_first_failure",
            FailurePolicy::CollectAll => "collect_all",
        }
    }
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Settings for a batch of handles
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub failure_policy: FailurePolicy,
}

/// Top-level configuration file (`gfe.toml`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GfeConfig {
    pub task: TaskConfig,
    pub batch: BatchConfig,
}

impl GfeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: GfeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.task.validate()
    }
}
