//! Command-line interface for ticker
//!
//! This module defines the CLI structure using clap derive macros.
//! Each group of subcommands lives in its own submodule.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::Result;
use crate::repository::TaskRepository;
use crate::store::JsonFileStore;

mod init;
mod task;

/// ticker - personal task tracker
///
/// Tasks carry a due date, a group and an optional dependency. A task cannot
/// be marked done before the task it depends on.
#[derive(Parser, Debug)]
#[command(name = "ticker")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory holding ticker.toml and the task document
    #[arg(long, global = true, env = "TICKER_DIR")]
    pub dir: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory and a default ticker.toml
    Init,

    /// Add a task
    Add {
        /// Task title
        title: String,

        /// Due date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        due: Option<String>,

        /// Group name (defaults to tasks.default_group)
        #[arg(long)]
        group: Option<String>,

        /// Manual ordering hint
        #[arg(long = "seq", allow_negative_numbers = true)]
        sequence: Option<i64>,

        /// Task that must be done first (id or unique id prefix)
        #[arg(long)]
        depends_on: Option<String>,
    },

    /// List tasks
    #[command(alias = "ls")]
    List {
        /// Status filter: all, pending, done
        #[arg(long, default_value = "all")]
        status: String,

        /// Group filter ("All Groups" or blank for every group)
        #[arg(long)]
        group: Option<String>,

        /// Sort key: due_date, created_at, priority, sequence
        #[arg(long)]
        sort: Option<String>,
    },

    /// Show a single task
    Show {
        /// Task id or unique id prefix
        id: String,
    },

    /// Toggle a task between pending and done
    Toggle {
        /// Task id or unique id prefix
        id: String,
    },

    /// Delete a task
    #[command(alias = "delete")]
    Rm {
        /// Task id or unique id prefix
        id: String,
    },

    /// List distinct groups
    Groups,

    /// Dependency management
    #[command(subcommand)]
    Depends(DependsCommands),
}

/// Dependency subcommands
#[derive(Subcommand, Debug)]
pub enum DependsCommands {
    /// Remove a task's dependency
    Clear {
        /// Task id or unique id prefix
        id: String,
    },
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let data_dir = resolve_data_dir(self.dir);
        match self.command {
            Commands::Init => init::run(init::InitOptions {
                data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Add {
                title,
                due,
                group,
                sequence,
                depends_on,
            } => task::run_add(task::AddOptions {
                title,
                due,
                group,
                sequence,
                depends_on,
                data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::List {
                status,
                group,
                sort,
            } => task::run_list(task::ListOptions {
                status,
                group,
                sort,
                data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Show { id } => task::run_show(task::TargetOptions {
                id,
                data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Toggle { id } => task::run_toggle(task::TargetOptions {
                id,
                data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Rm { id } => task::run_rm(task::TargetOptions {
                id,
                data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Groups => task::run_groups(task::GroupsOptions {
                data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Depends(cmd) => match cmd {
                DependsCommands::Clear { id } => {
                    task::run_depends_clear(task::TargetOptions {
                        id,
                        data_dir,
                        json: self.json,
                        quiet: self.quiet,
                    })
                }
            },
        }
    }
}

/// `--dir` / `TICKER_DIR`, else the platform data directory, else `.`
pub fn resolve_data_dir(dir: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = dir {
        return dir;
    }
    directories::ProjectDirs::from("", "", "ticker")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Everything a task command needs, loaded from one data directory
struct TaskContext {
    tasks_path: PathBuf,
    repo: TaskRepository<JsonFileStore>,
}

fn load_context(data_dir: &Path) -> TaskContext {
    let config = Config::load_from_dir(data_dir);
    let tasks_path = config.tasks_path(data_dir);
    let store = JsonFileStore::new(tasks_path.clone(), config.backup_path(data_dir));
    let span = tracing::info_span!("tasks", dir = %data_dir.display());
    let repo = TaskRepository::open_with_span(store, config.tasks, span);
    TaskContext { tasks_path, repo }
}
