//! In-memory task collection and the rules that guard it.
//!
//! Tasks are kept in a map keyed by id, with a separate ordering that `sort`
//! rearranges. `filter` derives the visible view from that ordering and
//! remembers it so callers can address tasks by position until the next
//! mutation or sort.
//!
//! Every mutation is applied in memory first and then saved through the
//! [`TaskStore`]. A failed save is logged and returned as a warning; the
//! in-memory change is kept.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use serde::Serialize;
use tracing::span::EnteredSpan;
use tracing::Span;
use uuid::Uuid;

use crate::config::TasksConfig;
use crate::error::{Error, Result};
use crate::store::TaskStore;
use crate::task::{
    normalize_group, validate_title, GroupFilter, NewTask, SortKey, StatusFilter, Task,
    TaskStatus, DEFAULT_SEQUENCE,
};

/// Shortest id prefix accepted by [`TaskRepository::resolve_id`]
pub const MIN_ID_PREFIX_LEN: usize = 4;

/// Result of a mutation. `warning` is set when the change could not be saved.
#[derive(Debug, Clone)]
pub struct Applied<T> {
    pub value: T,
    pub warning: Option<String>,
}

/// A removed task and the dependents left pointing at it
#[derive(Debug, Clone, Serialize)]
pub struct Deleted {
    pub task: Task,
    pub orphaned: Vec<String>,
}

pub struct TaskRepository<S: TaskStore> {
    store: S,
    config: TasksConfig,
    span: Span,
    tasks: HashMap<String, Task>,
    order: Vec<String>,
    visible: Option<Vec<String>>,
    load_warning: Option<String>,
}

impl<S: TaskStore> TaskRepository<S> {
    /// Load the collection from `store`, logging under a default `tasks` span
    pub fn open(store: S, config: TasksConfig) -> Self {
        Self::open_with_span(store, config, tracing::info_span!("tasks"))
    }

    /// Load the collection from `store`; all repository logging happens inside `span`.
    ///
    /// A store that fails to load is logged and treated as empty.
    pub fn open_with_span(store: S, config: TasksConfig, span: Span) -> Self {
        let (loaded, load_warning) = {
            let _entered = span.enter();
            match store.load() {
                Ok(tasks) => (tasks, None),
                Err(err) => {
                    tracing::warn!(error = %err, "failed to load tasks; starting with an empty list");
                    (Vec::new(), Some(format!("tasks not loaded: {err}")))
                }
            }
        };

        let mut repo = Self {
            store,
            config,
            span,
            tasks: HashMap::with_capacity(loaded.len()),
            order: Vec::with_capacity(loaded.len()),
            visible: None,
            load_warning,
        };
        let _entered = repo.enter();
        for task in loaded {
            if repo.tasks.contains_key(&task.id) {
                tracing::warn!(id = %task.id, "skipping task with duplicate id");
                continue;
            }
            repo.order.push(task.id.clone());
            repo.tasks.insert(task.id.clone(), task);
        }
        tracing::info!(count = repo.order.len(), "tasks loaded");
        repo
    }

    pub fn config(&self) -> &TasksConfig {
        &self.config
    }

    /// Why the collection started empty, if loading failed
    pub fn load_warning(&self) -> Option<&str> {
        self.load_warning.as_deref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    /// All tasks in current order
    pub fn tasks(&self) -> Vec<&Task> {
        self.order.iter().filter_map(|id| self.tasks.get(id)).collect()
    }

    /// Create a task. Validation failures leave the collection untouched.
    pub fn add(&mut self, new: NewTask) -> Result<Applied<Task>> {
        let _entered = self.enter();
        let title = validate_title(&new.title)?;
        let id = self.generate_id();

        if let Some(dependency_id) = new.depends_on.as_deref() {
            if dependency_id == id {
                return Err(Error::SelfDependency);
            }
            let dependency = self
                .tasks
                .get(dependency_id)
                .ok_or_else(|| Error::DependencyNotFound(dependency_id.to_string()))?;
            if let Some(dependency_due) = dependency.due_date {
                if dependency_due > new.due_date {
                    return Err(Error::UnmetDueDateOrder {
                        due_date: new.due_date,
                        dependency_due,
                    });
                }
            }
        }

        let task = Task {
            id: id.clone(),
            title,
            group: normalize_group(new.group.as_deref(), &self.config.default_group),
            due_date: Some(new.due_date),
            priority: Some(self.config.default_priority),
            sequence: Some(new.sequence.unwrap_or(DEFAULT_SEQUENCE)),
            status: TaskStatus::Pending,
            created_at: Utc::now(),
            depends_on: new.depends_on,
        };

        self.tasks.insert(id.clone(), task.clone());
        self.order.push(id);
        self.visible = None;
        tracing::info!(id = %task.id, title = %task.title, group = %task.group, "task added");

        let warning = self.persist();
        Ok(Applied {
            value: task,
            warning,
        })
    }

    /// Remove a task. Dependents keep their (now dangling) reference and are
    /// reported in [`Deleted::orphaned`].
    pub fn delete(&mut self, id: &str) -> Result<Applied<Deleted>> {
        let _entered = self.enter();
        let task = self
            .tasks
            .remove(id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        self.order.retain(|entry| entry != id);
        self.visible = None;

        let orphaned: Vec<String> = self
            .order
            .iter()
            .filter(|other| {
                self.tasks
                    .get(other.as_str())
                    .and_then(|t| t.depends_on.as_deref())
                    == Some(id)
            })
            .cloned()
            .collect();
        tracing::info!(id = %task.id, title = %task.title, "task deleted");
        if !orphaned.is_empty() {
            tracing::warn!(
                id = %task.id,
                dependents = ?orphaned,
                "deleted task still has dependents; they stay blocked until their dependency is cleared"
            );
        }

        let warning = self.persist();
        Ok(Applied {
            value: Deleted { task, orphaned },
            warning,
        })
    }

    /// Flip a task between pending and done.
    ///
    /// Completing a task requires its dependency to exist and be done.
    /// Reopening is always allowed.
    pub fn toggle_status(&mut self, id: &str) -> Result<Applied<TaskStatus>> {
        let _entered = self.enter();
        let task = self
            .tasks
            .get(id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        let next = task.status.toggled();
        if next == TaskStatus::Done {
            if let Err(err) = self.check_dependency_done(task) {
                tracing::debug!(id = %id, error = %err, "status change blocked");
                return Err(err);
            }
        }

        if let Some(task) = self.tasks.get_mut(id) {
            task.status = next;
        }
        self.visible = None;
        tracing::info!(id = %id, status = %next, "task status toggled");

        let warning = self.persist();
        Ok(Applied {
            value: next,
            warning,
        })
    }

    /// Drop a task's dependency, returning the id it pointed at
    pub fn clear_dependency(&mut self, id: &str) -> Result<Applied<Option<String>>> {
        let _entered = self.enter();
        let task = self
            .tasks
            .get_mut(id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        let removed = task.depends_on.take();
        if removed.is_none() {
            return Ok(Applied {
                value: None,
                warning: None,
            });
        }

        self.visible = None;
        tracing::info!(id = %id, dependency = ?removed, "dependency cleared");
        let warning = self.persist();
        Ok(Applied {
            value: removed,
            warning,
        })
    }

    /// Tasks matching both filters, in current order. The result becomes the
    /// visible view addressed by [`TaskRepository::task_at`].
    pub fn filter(&mut self, status: StatusFilter, group: GroupFilter) -> Vec<&Task> {
        let ids: Vec<String> = self
            .order
            .iter()
            .filter(|id| {
                self.tasks
                    .get(id.as_str())
                    .map(|task| status.matches(task.status) && group.matches(&task.group))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        self.visible = Some(ids);
        self.visible_tasks()
    }

    /// Task at `position` (0-based) in the last filtered view
    pub fn task_at(&self, position: usize) -> Result<&Task> {
        let visible = self.visible.as_ref().ok_or(Error::StaleView)?;
        let id = visible.get(position).ok_or_else(|| {
            Error::InvalidArgument(format!(
                "no task at position {} ({} visible)",
                position + 1,
                visible.len()
            ))
        })?;
        self.tasks.get(id).ok_or(Error::StaleView)
    }

    /// Stable ascending sort of the whole collection
    pub fn sort(&mut self, key: SortKey) {
        let tasks = &self.tasks;
        self.order.sort_by(|left, right| match (tasks.get(left), tasks.get(right)) {
            (Some(left), Some(right)) => key.compare(left, right),
            _ => std::cmp::Ordering::Equal,
        });
        self.visible = None;
        tracing::debug!(parent: &self.span, key = %key, "tasks sorted");
    }

    /// Distinct group names
    pub fn list_groups(&self) -> BTreeSet<String> {
        self.tasks.values().map(|task| task.group.clone()).collect()
    }

    /// Tasks whose dependency is `id`, in current order
    pub fn dependents(&self, id: &str) -> Vec<&Task> {
        self.tasks()
            .into_iter()
            .filter(|task| task.depends_on.as_deref() == Some(id))
            .collect()
    }

    /// Whether the task waits on a dependency that is not done (or no longer exists)
    pub fn is_blocked(&self, task: &Task) -> bool {
        match task.depends_on.as_deref() {
            Some(dependency_id) => self
                .tasks
                .get(dependency_id)
                .map(|dependency| !dependency.is_done())
                .unwrap_or(true),
            None => false,
        }
    }

    /// Resolve a full id, a unique id prefix, or a `abcdef...` label suffix
    pub fn resolve_id(&self, input: &str) -> Result<String> {
        let trimmed = input.trim().trim_end_matches("...");
        if trimmed.is_empty() {
            return Err(Error::InvalidArgument("task id cannot be empty".to_string()));
        }
        if self.tasks.contains_key(trimmed) {
            return Ok(trimmed.to_string());
        }
        if trimmed.len() < MIN_ID_PREFIX_LEN {
            return Err(Error::TaskNotFound(trimmed.to_string()));
        }

        let needle = trimmed.to_ascii_lowercase();
        let matches: Vec<&String> = self
            .order
            .iter()
            .filter(|id| id.to_ascii_lowercase().starts_with(&needle))
            .collect();
        match matches.as_slice() {
            [] => Err(Error::TaskNotFound(trimmed.to_string())),
            [id] => Ok((*id).clone()),
            _ => Err(Error::AmbiguousId {
                input: trimmed.to_string(),
                matches: matches.len(),
            }),
        }
    }

    fn visible_tasks(&self) -> Vec<&Task> {
        self.visible
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter_map(|id| self.tasks.get(id))
            .collect()
    }

    fn check_dependency_done(&self, task: &Task) -> Result<()> {
        let Some(dependency_id) = task.depends_on.as_deref() else {
            return Ok(());
        };
        match self.tasks.get(dependency_id) {
            Some(dependency) if dependency.is_done() => Ok(()),
            Some(dependency) => Err(Error::DependencyUnmet {
                dependency_id: dependency.id.clone(),
                dependency_title: dependency.title.clone(),
            }),
            None => Err(Error::DependencyMissing {
                dependency_id: dependency_id.to_string(),
            }),
        }
    }

    fn generate_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if !self.tasks.contains_key(&id) {
                return id;
            }
        }
    }

    fn enter(&self) -> EnteredSpan {
        self.span.clone().entered()
    }

    /// Save the full collection with a backup. Failures become a warning.
    fn persist(&self) -> Option<String> {
        let snapshot: Vec<Task> = self
            .order
            .iter()
            .filter_map(|id| self.tasks.get(id).cloned())
            .collect();
        match self.store.save(&snapshot, true) {
            Ok(()) => None,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    count = snapshot.len(),
                    "failed to save tasks; change kept in memory"
                );
                Some(format!("tasks not saved: {err}"))
            }
        }
    }
}
