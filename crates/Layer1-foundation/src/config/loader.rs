//! Configuration Loader
//!
//! ## Search priority
//!
//! 1. User-level: `~/.gfe/gfe.toml`
//! 2. Project-level: `.gfe/gfe.toml`
//! 3. Local (gitignored): `.gfe/gfe.local.toml`
//!
//! Each level overrides the keys it sets; tables are merged recursively.

use super::types::GfeConfig;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use toml::Table;
use tracing::{debug, info, warn};

/// Configuration directory name
pub const CONFIG_DIR_NAME: &str = ".gfe";

/// Configuration file name
pub const CONFIG_FILE: &str = "gfe.toml";

const LOCAL_CONFIG_FILE: &str = "gfe.local.toml";

/// Configuration loader
pub struct ConfigLoader {
    search_paths: Vec<ConfigPath>,
}

#[derive(Debug, Clone)]
struct ConfigPath {
    path: PathBuf,
    /// Higher wins
    priority: u8,
    description: &'static str,
}

impl ConfigLoader {
    /// Loader with the default search paths
    pub fn new(working_dir: &Path) -> Self {
        let mut paths = Vec::new();

        if let Some(home) = dirs::home_dir() {
            paths.push(ConfigPath {
                path: home.join(CONFIG_DIR_NAME).join(CONFIG_FILE),
                priority: 10,
                description: "User settings",
            });
        }

        paths.push(ConfigPath {
            path: working_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE),
            priority: 20,
            description: "Project settings",
        });

        paths.push(ConfigPath {
            path: working_dir.join(CONFIG_DIR_NAME).join(LOCAL_CONFIG_FILE),
            priority: 30,
            description: "Local settings",
        });

        paths.sort_by_key(|p| p.priority);

        Self { search_paths: paths }
    }

    /// Loader over explicit paths, later paths win
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        let search_paths = paths
            .into_iter()
            .enumerate()
            .map(|(i, path)| ConfigPath {
                path,
                priority: i.min(u8::MAX as usize) as u8,
                description: "Custom",
            })
            .collect();

        Self { search_paths }
    }

    /// Add a search path
    pub fn add_path(&mut self, path: PathBuf, priority: u8) {
        self.search_paths.push(ConfigPath {
            path,
            priority,
            description: "Added",
        });
        self.search_paths.sort_by_key(|p| p.priority);
    }

    /// Load and merge every existing file.
    ///
    /// Files that cannot be read or parsed are skipped with a warning; the
    /// merged result must still validate.
    pub fn load_all(&self) -> Result<GfeConfig> {
        let mut merged = Table::new();

        for config_path in &self.search_paths {
            if !config_path.path.exists() {
                continue;
            }

            match read_table(&config_path.path) {
                Ok(table) => {
                    info!(
                        "Loaded {} from: {}",
                        config_path.description,
                        config_path.path.display()
                    );
                    merge_tables(&mut merged, table);
                }
                Err(e) => {
                    warn!(
                        "Failed to load settings from {}: {}",
                        config_path.path.display(),
                        e
                    );
                }
            }
        }

        let config: GfeConfig = toml::Value::Table(merged).try_into()?;
        config.validate()?;
        Ok(config)
    }

    /// Existing configuration files, lowest priority first
    pub fn existing_files(&self) -> Vec<PathBuf> {
        self.search_paths
            .iter()
            .filter(|p| p.path.exists())
            .map(|p| p.path.clone())
            .collect()
    }
}

/// Load one configuration file; errors are returned, not skipped
pub fn load_config_from_file(path: &Path) -> Result<GfeConfig> {
    let table = read_table(path)?;
    let config: GfeConfig = toml::Value::Table(table).try_into()?;
    config.validate()?;

    debug!(
        "Loaded config from {}: prefix {}, policy {}",
        path.display(),
        config.task.thread_name_prefix,
        config.batch.failure_policy
    );

    Ok(config)
}

/// Merge `later` into `base`; nested tables merge, other values replace
pub fn merge_tables(base: &mut Table, later: Table) {
    for (key, value) in later {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

fn read_table(path: &Path) -> Result<Table> {
    let content = std::fs::read_to_string(path)?;
    content
        .parse::<Table>()
        .map_err(|e| Error::config_parse(path.display().to_string(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FailurePolicy;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_merge_tables() {
        let mut base: Table = "[task]\nthread_name_prefix = \"a\"\nstack_size = 1024\n"
            .parse()
            .unwrap();
        let later: Table = "[task]\nthread_name_prefix = \"b\"\n".parse().unwrap();

        merge_tables(&mut base, later);

        let task = base["task"].as_table().unwrap();
        assert_eq!(task["thread_name_prefix"].as_str(), Some("b"));
        assert_eq!(task["stack_size"].as_integer(), Some(1024));
    }

    #[test]
    fn test_load_all_priority() {
        let dir = TempDir::new().unwrap();
        let low = write(
            dir.path(),
            "low.toml",
            "[task]\nthread_name_prefix = \"low\"\nstack_size = 65536\n",
        );
        let high = write(
            dir.path(),
            "high.toml",
            "[task]\nthread_name_prefix = \"high\"\n[batch]\nfailure_policy = \"abort_on_first_failure\"\n",
        );

        let loader = ConfigLoader::with_paths(vec![low, high]);
        let config = loader.load_all().unwrap();

        assert_eq!(config.task.thread_name_prefix, "high");
        assert_eq!(config.task.stack_size, Some(65536));
        assert_eq!(config.batch.failure_policy, FailurePolicy::AbortOnFirstFailure);
    }

    #[test]
    fn test_load_all_skips_broken_files() {
        let dir = TempDir::new().unwrap();
        let good = write(dir.path(), "good.toml", "[task]\nthread_name_prefix = \"ok\"\n");
        let broken = write(dir.path(), "broken.toml", "[task\nnot toml");
        let missing = dir.path().join("missing.toml");

        let loader = ConfigLoader::with_paths(vec![good, broken, missing]);
        let config = loader.load_all().unwrap();

        assert_eq!(config.task.thread_name_prefix, "ok");
        assert_eq!(loader.existing_files().len(), 2);
    }

    #[test]
    fn test_project_layout() {
        let dir = TempDir::new().unwrap();
        let config_dir = dir.path().join(CONFIG_DIR_NAME);
        std::fs::create_dir_all(&config_dir).unwrap();
        write(&config_dir, CONFIG_FILE, "[task]\nthread_name_prefix = \"proj\"\n");
        write(&config_dir, LOCAL_CONFIG_FILE, "[task]\nstack_size = 4096\n");

        let loader = ConfigLoader::with_paths(vec![
            config_dir.join(CONFIG_FILE),
            config_dir.join(LOCAL_CONFIG_FILE),
        ]);
        let config = loader.load_all().unwrap();

        assert_eq!(config.task.thread_name_prefix, "proj");
        assert_eq!(config.task.stack_size, Some(4096));
    }

    #[test]
    fn test_load_single_file_errors() {
        let dir = TempDir::new().unwrap();
        let broken = write(dir.path(), "broken.toml", "[task\n");
        let err = load_config_from_file(&broken).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));

        let err = load_config_from_file(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
