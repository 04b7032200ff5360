//! # gfe-foundation
//!
//! Foundation layer for the graph front end:
//! - Error: shared `Error`/`Result`
//! - Config: layered `gfe.toml` settings (task threads, batch policy)
//! - Core: placement identity and the progress indicator contract

pub mod config;
pub mod core;
pub mod error;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Core
// ============================================================================
pub use crate::core::{Placement, Progress, ProgressCounter};

// ============================================================================
// Config
// ============================================================================
pub use config::{
    load_config_from_file, BatchConfig, ConfigLoader, FailurePolicy, GfeConfig, TaskConfig,
    CONFIG_DIR_NAME, CONFIG_FILE,
};
