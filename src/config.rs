//! Configuration loading and management
//!
//! Handles parsing of `ticker.toml` in the data directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::task::{Priority, SortKey};

/// Name of the configuration file inside the data directory
pub const CONFIG_FILE: &str = "ticker.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Document locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Task defaults
    #[serde(default)]
    pub tasks: TasksConfig,
}

/// Where the task document and its backup live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Task document, relative to the data directory unless absolute
    #[serde(default = "default_tasks_path")]
    pub tasks: PathBuf,

    /// Backup copy written before each save
    #[serde(default = "default_backup_path")]
    pub backup: PathBuf,
}

fn default_tasks_path() -> PathBuf {
    PathBuf::from("tasks.json")
}

fn default_backup_path() -> PathBuf {
    PathBuf::from("tasks_backup.json")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            tasks: default_tasks_path(),
            backup: default_backup_path(),
        }
    }
}

/// Tasks configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Group assigned when none is given
    #[serde(default = "default_group")]
    pub default_group: String,

    /// Sort key used by `ticker list` when none is given
    #[serde(default = "default_sort")]
    pub default_sort: SortKey,

    /// Priority assigned to new tasks
    #[serde(default)]
    pub default_priority: Priority,
}

fn default_group() -> String {
    "General".to_string()
}

fn default_sort() -> SortKey {
    SortKey::DueDate
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            default_group: default_group(),
            default_sort: default_sort(),
            default_priority: Priority::default(),
        }
    }
}

impl TasksConfig {
    fn validate(&self) -> crate::error::Result<()> {
        if self.default_group.trim().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "tasks.default_group cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl PathsConfig {
    fn validate(&self) -> crate::error::Result<()> {
        if self.tasks.as_os_str().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "paths.tasks cannot be empty".to_string(),
            ));
        }
        if self.backup.as_os_str().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "paths.backup cannot be empty".to_string(),
            ));
        }
        if self.tasks == self.backup {
            return Err(crate::error::Error::InvalidConfig(
                "paths.backup must differ from paths.tasks".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a `ticker.toml` file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the data directory, or return defaults
    pub fn load_from_dir(data_dir: &Path) -> Self {
        let config_path = data_dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(
                    path = %config_path.display(),
                    error = %err,
                    "ignoring invalid config; using defaults"
                );
                Self::default()
            }
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Absolute path of the task document for this data directory
    pub fn tasks_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.paths.tasks)
    }

    /// Absolute path of the backup document for this data directory
    pub fn backup_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.paths.backup)
    }

    fn validate(&self) -> crate::error::Result<()> {
        self.paths.validate()?;
        self.tasks.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_expected() {
        let cfg = Config::default();
        assert_eq!(cfg.paths.tasks, PathBuf::from("tasks.json"));
        assert_eq!(cfg.paths.backup, PathBuf::from("tasks_backup.json"));
        assert_eq!(cfg.tasks.default_group, "General");
        assert_eq!(cfg.tasks.default_sort, SortKey::DueDate);
        assert_eq!(cfg.tasks.default_priority, Priority::Normal);
    }

    #[test]
    fn load_parses_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        let content = r#"
[paths]
tasks = "data/my_tasks.json"
backup = "data/my_tasks.bak.json"

[tasks]
default_group = "Personal"
default_sort = "sequence"
default_priority = "high"
"#;
        fs::write(&path, content.trim()).expect("write config");

        let cfg = Config::load(&path).expect("load config");
        assert_eq!(cfg.paths.tasks, PathBuf::from("data/my_tasks.json"));
        assert_eq!(cfg.paths.backup, PathBuf::from("data/my_tasks.bak.json"));
        assert_eq!(cfg.tasks.default_group, "Personal");
        assert_eq!(cfg.tasks.default_sort, SortKey::Sequence);
        assert_eq!(cfg.tasks.default_priority, Priority::High);
        assert_eq!(
            cfg.tasks_path(dir.path()),
            dir.path().join("data/my_tasks.json")
        );
    }

    #[test]
    fn blank_default_group_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[tasks]\ndefault_group = \"  \"").expect("write config");

        let err = Config::load(&path).expect_err("invalid config");
        match err {
            crate::error::Error::InvalidConfig(_) => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn backup_must_differ_from_tasks() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[paths]\ntasks = \"a.json\"\nbackup = \"a.json\"").expect("write config");

        let err = Config::load(&path).expect_err("invalid config");
        assert!(matches!(err, crate::error::Error::InvalidConfig(_)));
    }

    #[test]
    fn unknown_sort_key_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[tasks]\ndefault_sort = \"title\"").expect("write config");

        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn load_from_dir_defaults_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from_dir(dir.path());
        assert_eq!(cfg.tasks.default_group, "General");
    }

    #[test]
    fn load_from_dir_defaults_when_invalid() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join(CONFIG_FILE), "this = [not valid").expect("write config");
        let cfg = Config::load_from_dir(dir.path());
        assert_eq!(cfg.tasks.default_sort, SortKey::DueDate);
    }

    #[test]
    fn save_writes_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.toml");
        let cfg = Config::default();
        cfg.save(&path).expect("save config");

        let written = fs::read_to_string(&path).expect("read config");
        assert!(written.contains("default_group = \"General\""));
        assert!(written.contains("default_sort = \"due_date\""));

        let reloaded = Config::load(&path).expect("reload");
        assert_eq!(reloaded.tasks.default_priority, Priority::Normal);
    }
}
