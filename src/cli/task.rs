//! ticker task command implementations.

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::cli::load_context;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::repository::TaskRepository;
use crate::store::TaskStore;
use crate::task::{
    validate_title, GroupFilter, NewTask, SortKey, StatusFilter, Task, TaskStatus, ALL_GROUPS,
};

pub struct AddOptions {
    pub title: String,
    pub due: Option<String>,
    pub group: Option<String>,
    pub sequence: Option<i64>,
    pub depends_on: Option<String>,
    pub data_dir: PathBuf,
    pub json: bool,
    pub quiet: bool,
}

pub struct ListOptions {
    pub status: String,
    pub group: Option<String>,
    pub sort: Option<String>,
    pub data_dir: PathBuf,
    pub json: bool,
    pub quiet: bool,
}

/// Options for commands that act on a single task
pub struct TargetOptions {
    pub id: String,
    pub data_dir: PathBuf,
    pub json: bool,
    pub quiet: bool,
}

pub struct GroupsOptions {
    pub data_dir: PathBuf,
    pub json: bool,
    pub quiet: bool,
}

pub fn run_add(options: AddOptions) -> Result<()> {
    let mut ctx = load_context(&options.data_dir);
    let title = validate_title(&options.title)?;
    let due_date = parse_due(options.due.as_deref())?;
    let depends_on = match options.depends_on.as_deref() {
        Some(input) => Some(ctx.repo.resolve_id(input).map_err(as_dependency_error)?),
        None => None,
    };

    let mut new_task = NewTask::new(title, due_date);
    new_task.group = options.group;
    new_task.sequence = options.sequence;
    new_task.depends_on = depends_on;

    let applied = ctx.repo.add(new_task)?;
    let task = applied.value;
    let view = TaskView::new(&ctx.repo, task.clone());

    let mut human = HumanOutput::new("Task added");
    push_load_warning(&mut human, &ctx.repo);
    human.push_optional_warning(applied.warning);
    human.push_summary("ID", task.id.clone());
    human.push_summary("Title", task.title.clone());
    human.push_summary("Group", task.group.clone());
    human.push_summary("Due", format_due(&task));
    human.push_summary("Sequence", format_sequence(&task));
    if let Some(label) = dependency_label(&ctx.repo, &task) {
        human.push_summary("Depends on", label);
    }
    human.push_next_step("ticker list");

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "add",
        &view,
        Some(&human),
    )
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let mut ctx = load_context(&options.data_dir);
    let status: StatusFilter = options.status.parse()?;
    let group = GroupFilter::parse(options.group.as_deref().unwrap_or(ALL_GROUPS));
    let sort = match options.sort.as_deref() {
        Some(raw) => raw.parse::<SortKey>()?,
        None => ctx.repo.config().default_sort,
    };

    ctx.repo.sort(sort);
    let visible: Vec<Task> = ctx
        .repo
        .filter(status, group.clone())
        .into_iter()
        .cloned()
        .collect();
    let rows: Vec<TaskView> = visible
        .into_iter()
        .map(|task| TaskView::new(&ctx.repo, task))
        .collect();

    let mut human = HumanOutput::new("Tasks");
    push_load_warning(&mut human, &ctx.repo);
    human.push_summary("Total", rows.len().to_string());
    if status != StatusFilter::All {
        human.push_summary("Status", options.status.trim().to_ascii_lowercase());
    }
    if let GroupFilter::Named(name) = &group {
        human.push_summary("Group", name.clone());
    }
    human.push_summary("Sort", sort.to_string());
    human.push_summary("File", ctx.tasks_path.display().to_string());
    for row in &rows {
        human.push_detail(format_row(&row.task, row.blocked));
    }
    if rows.is_empty() && ctx.repo.is_empty() {
        human.push_next_step("ticker add \"<title>\" --due YYYY-MM-DD");
    }

    let output = TaskListOutput {
        total: rows.len(),
        sort,
        tasks: rows,
    };

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "list",
        &output,
        Some(&human),
    )
}

pub fn run_show(options: TargetOptions) -> Result<()> {
    let ctx = load_context(&options.data_dir);
    let id = ctx.repo.resolve_id(&options.id)?;
    let task = ctx
        .repo
        .get(&id)
        .cloned()
        .ok_or_else(|| Error::TaskNotFound(id.clone()))?;

    let dependency = task.depends_on.as_deref().map(|dependency_id| {
        match ctx.repo.get(dependency_id) {
            Some(dependency) => DependencyView {
                id: dependency.id.clone(),
                title: Some(dependency.title.clone()),
                status: Some(dependency.status),
                exists: true,
            },
            None => DependencyView {
                id: dependency_id.to_string(),
                title: None,
                status: None,
                exists: false,
            },
        }
    });
    let dependents: Vec<Task> = ctx.repo.dependents(&id).into_iter().cloned().collect();

    let mut human = HumanOutput::new(format!("Task {id}"));
    push_load_warning(&mut human, &ctx.repo);
    human.push_summary("Title", task.title.clone());
    human.push_summary("Status", task.status.to_string());
    human.push_summary("Group", task.group.clone());
    human.push_summary("Due", format_due(&task));
    human.push_summary(
        "Priority",
        task.priority
            .map(|priority| priority.to_string())
            .unwrap_or_else(|| "none".to_string()),
    );
    human.push_summary("Sequence", format_sequence(&task));
    human.push_summary("Created", task.created_at.to_rfc3339());
    if let Some(label) = dependency_label(&ctx.repo, &task) {
        human.push_summary("Depends on", label);
    }
    if ctx.repo.is_blocked(&task) {
        human.push_summary("Blocked", "yes");
    }
    for dependent in &dependents {
        human.push_detail(format!("required by {}", dependent.dependency_label()));
    }
    if dependency.as_ref().is_some_and(|dep| !dep.exists) {
        human.push_next_step(format!("ticker depends clear {}", task.short_id()));
    }

    let output = TaskShowOutput {
        task: TaskView::new(&ctx.repo, task),
        dependency,
        dependents: dependents.into_iter().map(|task| task.id).collect(),
    };

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "show",
        &output,
        Some(&human),
    )
}

pub fn run_toggle(options: TargetOptions) -> Result<()> {
    let mut ctx = load_context(&options.data_dir);
    let id = ctx.repo.resolve_id(&options.id)?;
    let applied = ctx.repo.toggle_status(&id)?;
    let status = applied.value;

    let header = match status {
        TaskStatus::Done => "Task marked done",
        TaskStatus::Pending => "Task reopened",
    };
    let mut human = HumanOutput::new(header);
    push_load_warning(&mut human, &ctx.repo);
    human.push_optional_warning(applied.warning);
    human.push_summary("ID", id.clone());
    if let Some(task) = ctx.repo.get(&id) {
        human.push_summary("Title", task.title.clone());
    }
    human.push_summary("Status", status.to_string());

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "toggle",
        &TaskStatusOutput { id, status },
        Some(&human),
    )
}

pub fn run_rm(options: TargetOptions) -> Result<()> {
    let mut ctx = load_context(&options.data_dir);
    let id = ctx.repo.resolve_id(&options.id)?;
    let applied = ctx.repo.delete(&id)?;
    let deleted = applied.value;

    let mut human = HumanOutput::new("Task deleted");
    push_load_warning(&mut human, &ctx.repo);
    human.push_optional_warning(applied.warning);
    human.push_summary("ID", deleted.task.id.clone());
    human.push_summary("Title", deleted.task.title.clone());
    if !deleted.orphaned.is_empty() {
        human.push_warning(format!(
            "{} task(s) depended on this task and stay blocked until their dependency is cleared",
            deleted.orphaned.len()
        ));
        for orphan in deleted.orphaned.iter().filter_map(|id| ctx.repo.get(id)) {
            human.push_detail(format!("orphaned {}", orphan.dependency_label()));
            human.push_next_step(format!("ticker depends clear {}", orphan.short_id()));
        }
    }

    let output = TaskDeleteOutput {
        id: deleted.task.id,
        orphaned: deleted.orphaned,
    };

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "rm",
        &output,
        Some(&human),
    )
}

pub fn run_groups(options: GroupsOptions) -> Result<()> {
    let ctx = load_context(&options.data_dir);
    let groups: Vec<String> = ctx.repo.list_groups().into_iter().collect();

    let mut human = HumanOutput::new("Groups");
    push_load_warning(&mut human, &ctx.repo);
    human.push_summary("Total", groups.len().to_string());
    for group in &groups {
        human.push_detail(group.clone());
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "groups",
        &GroupsOutput {
            total: groups.len(),
            groups,
        },
        Some(&human),
    )
}

pub fn run_depends_clear(options: TargetOptions) -> Result<()> {
    let mut ctx = load_context(&options.data_dir);
    let id = ctx.repo.resolve_id(&options.id)?;
    let applied = ctx.repo.clear_dependency(&id)?;
    let cleared = applied.value;

    let header = if cleared.is_some() {
        "Dependency cleared"
    } else {
        "No dependency to clear"
    };
    let mut human = HumanOutput::new(header);
    push_load_warning(&mut human, &ctx.repo);
    human.push_optional_warning(applied.warning);
    human.push_summary("ID", id.clone());
    if let Some(previous) = cleared.as_ref() {
        human.push_summary("Removed", previous.clone());
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "depends clear",
        &DependsClearOutput { id, cleared },
        Some(&human),
    )
}

/// Due date from `--due`, defaulting to today in local time
fn parse_due(raw: Option<&str>) -> Result<NaiveDate> {
    let Some(raw) = raw else {
        return Ok(Local::now().date_naive());
    };
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        Error::InvalidArgument(format!("invalid due date '{raw}' (expected YYYY-MM-DD)"))
    })
}

/// A dependency that cannot be resolved is reported as such, not as the
/// task being added
fn as_dependency_error(err: Error) -> Error {
    match err {
        Error::TaskNotFound(id) => Error::DependencyNotFound(id),
        other => other,
    }
}

fn push_load_warning<S: TaskStore>(human: &mut HumanOutput, repo: &TaskRepository<S>) {
    if let Some(warning) = repo.load_warning() {
        human.push_warning(warning);
    }
}

fn dependency_label<S: TaskStore>(repo: &TaskRepository<S>, task: &Task) -> Option<String> {
    let dependency_id = task.depends_on.as_deref()?;
    Some(match repo.get(dependency_id) {
        Some(dependency) => dependency.dependency_label(),
        None => format!("{dependency_id} (deleted)"),
    })
}

fn format_due(task: &Task) -> String {
    task.due_date
        .map(|date| date.to_string())
        .unwrap_or_else(|| "none".to_string())
}

fn format_sequence(task: &Task) -> String {
    task.sequence
        .map(|sequence| sequence.to_string())
        .unwrap_or_else(|| "?".to_string())
}

fn format_row(task: &Task, blocked: bool) -> String {
    let done = if task.is_done() { "✔ " } else { "" };
    let blocked = if blocked { " ⛔" } else { "" };
    format!(
        "{} [{}] {done}{} [{}] (Due: {}){blocked}",
        task.short_id(),
        format_sequence(task),
        task.title,
        task.group,
        format_due(task),
    )
}

#[derive(Serialize)]
struct TaskView {
    #[serde(flatten)]
    task: Task,
    blocked: bool,
}

impl TaskView {
    fn new<S: TaskStore>(repo: &TaskRepository<S>, task: Task) -> Self {
        let blocked = repo.is_blocked(&task);
        Self { task, blocked }
    }
}

#[derive(Serialize)]
struct TaskListOutput {
    total: usize,
    sort: SortKey,
    tasks: Vec<TaskView>,
}

#[derive(Serialize)]
struct DependencyView {
    id: String,
    title: Option<String>,
    status: Option<TaskStatus>,
    exists: bool,
}

#[derive(Serialize)]
struct TaskShowOutput {
    task: TaskView,
    dependency: Option<DependencyView>,
    dependents: Vec<String>,
}

#[derive(Serialize)]
struct TaskStatusOutput {
    id: String,
    status: TaskStatus,
}

#[derive(Serialize)]
struct TaskDeleteOutput {
    id: String,
    orphaned: Vec<String>,
}

#[derive(Serialize)]
struct GroupsOutput {
    total: usize,
    groups: Vec<String>,
}

#[derive(Serialize)]
struct DependsClearOutput {
    id: String,
    cleared: Option<String>,
}
