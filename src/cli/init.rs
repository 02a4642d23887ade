//! ticker init command implementation
//!
//! Creates the data directory, a default `ticker.toml` and an empty task
//! document. Existing files are left alone.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{Config, CONFIG_FILE};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::store::{JsonFileStore, TaskStore};

pub struct InitOptions {
    pub data_dir: PathBuf,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct InitReport {
    data_dir: PathBuf,
    tasks_path: PathBuf,
    created: InitCreated,
}

#[derive(serde::Serialize)]
struct InitCreated {
    data_dir: bool,
    config: bool,
    tasks: bool,
}

pub fn run(options: InitOptions) -> Result<()> {
    let data_dir = options.data_dir;
    let created_dir = ensure_dir(&data_dir)?;
    let created_config = ensure_config(&data_dir)?;

    // Re-read so a pre-existing config decides where the document goes
    let config = Config::load_from_dir(&data_dir);
    let store = JsonFileStore::new(config.tasks_path(&data_dir), config.backup_path(&data_dir));
    let created_tasks = ensure_tasks(&store)?;

    let report = InitReport {
        data_dir: data_dir.clone(),
        tasks_path: store.path().to_path_buf(),
        created: InitCreated {
            data_dir: created_dir,
            config: created_config,
            tasks: created_tasks,
        },
    };

    let mut created_items = Vec::new();
    if created_dir {
        created_items.push("data dir".to_string());
    }
    if created_config {
        created_items.push(CONFIG_FILE.to_string());
    }
    if created_tasks {
        created_items.push(config.paths.tasks.display().to_string());
    }

    let header = if created_items.is_empty() {
        "ticker init: nothing to do"
    } else {
        "ticker init: initialized"
    };

    let mut human = HumanOutput::new(header);
    human.push_summary("data dir", data_dir.display().to_string());
    human.push_summary(
        "created",
        if created_items.is_empty() {
            "none".to_string()
        } else {
            created_items.join(", ")
        },
    );
    human.push_next_step("ticker add \"<title>\" --due YYYY-MM-DD");

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "init",
        &report,
        Some(&human),
    )
}

fn ensure_dir(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    fs::create_dir_all(path)?;
    tracing::info!(dir = %path.display(), "created data directory");
    Ok(true)
}

fn ensure_config(data_dir: &Path) -> Result<bool> {
    let path = data_dir.join(CONFIG_FILE);
    if path.exists() {
        return Ok(false);
    }
    Config::default().save(&path)?;
    Ok(true)
}

fn ensure_tasks(store: &JsonFileStore) -> Result<bool> {
    if store.path().exists() {
        return Ok(false);
    }
    store.save(&[], false)?;
    Ok(true)
}
