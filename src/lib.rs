//! ticker - personal task tracker library
//!
//! Core functionality behind the `ticker` CLI: a task collection with
//! due dates, groups and single-task dependencies.
//!
//! # Core Concepts
//!
//! - **Dependency gating**: a task cannot be marked done while the task it
//!   depends on is pending (or has been deleted)
//! - **Due-date ordering**: a dependent task may not be due before its dependency
//! - **Visible view**: the result of the last filter, addressable by position
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `ticker.toml`
//! - `error`: Error types and result aliases
//! - `logging`: Tracing subscriber with the `ticker.log` file layer
//! - `output`: Human and JSON output envelopes
//! - `repository`: In-memory collection and the task rules
//! - `store`: JSON document persistence with backups
//! - `task`: Task model, filters and sort keys

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod repository;
pub mod store;
pub mod task;

pub use error::{Error, Result};
pub use repository::{Applied, Deleted, TaskRepository};
pub use store::{JsonFileStore, MemoryStore, TaskStore};
pub use task::{NewTask, Task, TaskStatus};
