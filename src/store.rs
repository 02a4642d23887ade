//! Persistence for the task collection.
//!
//! The collection is stored as a single JSON array. Before each overwrite
//! the previous document can be copied to a backup path.
//!
//! ```text
//! <data dir>/
//!   ticker.toml          # Configuration
//!   tasks.json           # Task document (JSON array)
//!   tasks_backup.json    # Copy of the previous tasks.json
//! ```

use std::cell::{Cell, RefCell};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::task::Task;

/// Load/save contract for the task collection
pub trait TaskStore {
    /// Load the persisted collection in stored order. A store with no data
    /// yet returns an empty collection.
    fn load(&self) -> Result<Vec<Task>>;

    /// Replace the persisted collection, optionally backing up the previous one
    fn save(&self, tasks: &[Task], make_backup: bool) -> Result<()>;
}

/// Task document on disk
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    /// Path to the task document
    path: PathBuf,
    /// Path the previous document is copied to before overwriting
    backup_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>, backup_path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            backup_path: backup_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Copy the current document to the backup path, if there is one
    fn backup(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        if let Some(parent) = self.backup_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&self.path, &self.backup_path)?;
        tracing::info!(backup = %self.backup_path.display(), "backup created");
        Ok(true)
    }
}

impl TaskStore for JsonFileStore {
    fn load(&self) -> Result<Vec<Task>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let tasks: Vec<Task> = serde_json::from_str(&content)?;
        tracing::debug!(path = %self.path.display(), count = tasks.len(), "tasks loaded");
        Ok(tasks)
    }

    fn save(&self, tasks: &[Task], make_backup: bool) -> Result<()> {
        if make_backup {
            self.backup()?;
        }
        let json = to_pretty_json(&tasks)?;
        write_atomic(&self.path, json.as_bytes())?;
        tracing::info!(path = %self.path.display(), count = tasks.len(), "tasks saved");
        Ok(())
    }
}

/// Serialize with four-space indentation
fn to_pretty_json<T: Serialize>(data: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    data.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(|err| Error::OperationFailed(err.to_string()))
}

/// Write data atomically using temp file + rename
///
/// Readers never see a partially written document.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    // Create temp file in same directory (for atomic rename)
    let temp_path = path.with_extension("tmp");

    let mut file = File::create(&temp_path)?;
    file.write_all(data)?;
    file.sync_all()?;

    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Non-persistent store. Keeps the last saved collection and can be told to
/// fail saves.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tasks: RefCell<Vec<Task>>,
    backups: RefCell<Vec<bool>>,
    fail_saves: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that starts out holding `tasks`
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: RefCell::new(tasks),
            ..Self::default()
        }
    }

    /// Make every following `save` fail with an I/O error
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.set(fail);
    }

    /// Collection from the last successful save
    pub fn saved(&self) -> Vec<Task> {
        self.tasks.borrow().clone()
    }

    /// Number of save attempts so far
    pub fn save_count(&self) -> usize {
        self.backups.borrow().len()
    }

    /// Backup flag passed to each save attempt, oldest first
    pub fn backup_flags(&self) -> Vec<bool> {
        self.backups.borrow().clone()
    }
}

impl TaskStore for MemoryStore {
    fn load(&self) -> Result<Vec<Task>> {
        Ok(self.tasks.borrow().clone())
    }

    fn save(&self, tasks: &[Task], make_backup: bool) -> Result<()> {
        self.backups.borrow_mut().push(make_backup);
        if self.fail_saves.get() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "memory store configured to fail",
            )));
        }
        *self.tasks.borrow_mut() = tasks.to_vec();
        Ok(())
    }
}

impl<S: TaskStore + ?Sized> TaskStore for &S {
    fn load(&self) -> Result<Vec<Task>> {
        (**self).load()
    }

    fn save(&self, tasks: &[Task], make_backup: bool) -> Result<()> {
        (**self).save(tasks, make_backup)
    }
}
