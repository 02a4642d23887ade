//! Error types for ticker
//!
//! Exit codes:
//! - 2: User error (bad args, unknown task, stale selection)
//! - 3: Blocked by a task rule (dependency not done, due date ordering)
//! - 4: Operation failed (I/O, JSON, TOML)

use chrono::NaiveDate;
use serde_json::json;
use thiserror::Error;

/// Exit codes for the ticker CLI
pub mod exit_codes {
    pub const USER_ERROR: i32 = 2;
    pub const RULE_BLOCKED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for ticker operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Task title cannot be empty")]
    EmptyTitle,

    #[error("A task cannot depend on itself")]
    SelfDependency,

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Dependency not found: {0}")]
    DependencyNotFound(String),

    #[error("Task id '{input}' is ambiguous ({matches} matches)")]
    AmbiguousId { input: String, matches: usize },

    #[error("Task view is stale; list tasks again before selecting by position")]
    StaleView,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Rule blocks (exit code 3)
    #[error("Dependent task is due {due_date}, earlier than its dependency ({dependency_due})")]
    UnmetDueDateOrder {
        due_date: NaiveDate,
        dependency_due: NaiveDate,
    },

    #[error("This task depends on '{dependency_title}' which is not yet done")]
    DependencyUnmet {
        dependency_id: String,
        dependency_title: String,
    },

    #[error("This task depends on {dependency_id}, which no longer exists; clear the dependency first")]
    DependencyMissing { dependency_id: String },

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::EmptyTitle
            | Error::SelfDependency
            | Error::TaskNotFound(_)
            | Error::DependencyNotFound(_)
            | Error::AmbiguousId { .. }
            | Error::StaleView
            | Error::InvalidArgument(_)
            | Error::InvalidConfig(_) => exit_codes::USER_ERROR,

            // Rule blocks
            Error::UnmetDueDateOrder { .. }
            | Error::DependencyUnmet { .. }
            | Error::DependencyMissing { .. } => exit_codes::RULE_BLOCKED,

            // Operation failures
            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured context for JSON error output
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::TaskNotFound(id) | Error::DependencyNotFound(id) => Some(json!({ "id": id })),
            Error::AmbiguousId { input, matches } => {
                Some(json!({ "input": input, "matches": matches }))
            }
            Error::UnmetDueDateOrder {
                due_date,
                dependency_due,
            } => Some(json!({
                "due_date": due_date.to_string(),
                "dependency_due": dependency_due.to_string(),
            })),
            Error::DependencyUnmet {
                dependency_id,
                dependency_title,
            } => Some(json!({
                "dependency_id": dependency_id,
                "dependency_title": dependency_title,
            })),
            Error::DependencyMissing { dependency_id } => {
                Some(json!({ "dependency_id": dependency_id }))
            }
            Error::InvalidArgument(message) | Error::InvalidConfig(message) => {
                Some(json!({ "message": message }))
            }
            _ => None,
        }
    }
}

/// Result type alias for ticker operations
pub type Result<T> = std::result::Result<T, Error>;
