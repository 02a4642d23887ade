#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;
use ticker::Task;

/// Throwaway data directory for one test
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn tasks_path(&self) -> PathBuf {
        self.dir.path().join("tasks.json")
    }

    pub fn backup_path(&self) -> PathBuf {
        self.dir.path().join("tasks_backup.json")
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn read_tasks(&self) -> Result<Vec<Task>, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(self.tasks_path())?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// `ticker` pointed at this directory, with tracing disabled
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("ticker").expect("binary");
        cmd.arg("--dir").arg(self.path()).env_remove("RUST_LOG");
        cmd
    }

    /// Run a command with `--json` and parse the envelope from stdout
    pub fn json(&self, args: &[&str]) -> Result<Value, Box<dyn std::error::Error>> {
        let output = self.cmd().arg("--json").args(args).output()?;
        Ok(serde_json::from_slice(&output.stdout)?)
    }

    /// Add a task and return its id
    pub fn add(&self, args: &[&str]) -> Result<String, Box<dyn std::error::Error>> {
        let mut full = vec!["add"];
        full.extend_from_slice(args);
        let value = self.json(&full)?;
        assert_eq!(value["status"], "success", "add failed: {value}");
        Ok(value["data"]["id"]
            .as_str()
            .ok_or("missing id")?
            .to_string())
    }
}
