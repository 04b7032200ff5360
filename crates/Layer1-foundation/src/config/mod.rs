//! Config - layered settings
//!
//! - `types.rs` - `GfeConfig` and its sections
//! - `loader.rs` - search-path loading and TOML table merging

mod loader;
mod types;

pub use loader::{load_config_from_file, merge_tables, ConfigLoader, CONFIG_DIR_NAME, CONFIG_FILE};
pub use types::{BatchConfig, FailurePolicy, GfeConfig, TaskConfig};
