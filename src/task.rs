//! Task model for ticker.
//!
//! Tasks are persisted as a flat JSON array. The persisted field for the
//! title is `task`; every other field keeps its Rust name.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Sequence assigned when the caller does not supply one
pub const DEFAULT_SEQUENCE: i64 = 1;

/// Label the group filter uses for "no group restriction"
pub const ALL_GROUPS: &str = "All Groups";

/// Rank used for absent numeric sort keys
const MISSING_RANK: i64 = 9999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Done,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Done => "done",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            TaskStatus::Pending => TaskStatus::Done,
            TaskStatus::Done => TaskStatus::Pending,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority. Only the default is assigned today; the field exists so
/// documents can carry it and sorting can use it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Normal,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
        }
    }

    /// Ordinal used for ascending sorts (high first)
    pub fn rank(self) -> i64 {
        match self {
            Priority::High => 0,
            Priority::Normal => 1,
            Priority::Low => 2,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(rename = "task")]
    pub title: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub sequence: Option<i64>,
    pub status: TaskStatus,
    #[serde(deserialize_with = "deserialize_created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub depends_on: Option<String>,
}

impl Task {
    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }

    /// First characters of the id, as shown in dependency labels
    pub fn short_id(&self) -> &str {
        let end = self
            .id
            .char_indices()
            .nth(6)
            .map(|(idx, _)| idx)
            .unwrap_or(self.id.len());
        &self.id[..end]
    }

    /// Label used when offering this task as a dependency target
    pub fn dependency_label(&self) -> String {
        format!("{} [{}] (ID: {}...)", self.title, self.group, self.short_id())
    }
}

/// Input for creating a task. Defaults are filled in by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub group: Option<String>,
    pub due_date: NaiveDate,
    pub sequence: Option<i64>,
    pub depends_on: Option<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>, due_date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            group: None,
            due_date,
            sequence: None,
            depends_on: None,
        }
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn sequence(mut self, sequence: i64) -> Self {
        self.sequence = Some(sequence);
        self
    }

    pub fn depends_on(mut self, id: impl Into<String>) -> Self {
        self.depends_on = Some(id.into());
        self
    }
}

/// Trim a title, rejecting blank input
pub fn validate_title(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyTitle);
    }
    Ok(trimmed.to_string())
}

/// Trim and title-case a group name, falling back to `default_group` when blank
pub fn normalize_group(raw: Option<&str>, default_group: &str) -> String {
    let trimmed = raw.map(str::trim).unwrap_or("");
    if trimmed.is_empty() {
        title_case(default_group.trim())
    } else {
        title_case(trimmed)
    }
}

/// Upper-case the first cased letter of every word, lower-case the rest.
/// A word starts after any uncased character (digits, punctuation, CJK, ...).
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_is_cased = false;
    for ch in value.chars() {
        let cased = ch.is_lowercase() || ch.is_uppercase();
        if cased && prev_is_cased {
            out.extend(ch.to_lowercase());
        } else if cased {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        prev_is_cased = cased;
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    DueDate,
    CreatedAt,
    Priority,
    Sequence,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [
        SortKey::DueDate,
        SortKey::CreatedAt,
        SortKey::Priority,
        SortKey::Sequence,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::DueDate => "due_date",
            SortKey::CreatedAt => "created_at",
            SortKey::Priority => "priority",
            SortKey::Sequence => "sequence",
        }
    }

    /// Ascending comparison; absent values sort last.
    pub fn compare(self, left: &Task, right: &Task) -> Ordering {
        match self {
            SortKey::DueDate => due_rank(left).cmp(&due_rank(right)),
            SortKey::CreatedAt => left.created_at.cmp(&right.created_at),
            SortKey::Priority => priority_rank(left).cmp(&priority_rank(right)),
            SortKey::Sequence => sequence_rank(left).cmp(&sequence_rank(right)),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        SortKey::ALL
            .into_iter()
            .find(|key| key.as_str() == normalized)
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "unknown sort key '{}' (expected due_date|created_at|priority|sequence)",
                    s.trim()
                ))
            })
    }
}

fn missing_due_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX)
}

fn due_rank(task: &Task) -> NaiveDate {
    task.due_date.unwrap_or_else(missing_due_date)
}

fn priority_rank(task: &Task) -> i64 {
    task.priority.map(Priority::rank).unwrap_or(MISSING_RANK)
}

fn sequence_rank(task: &Task) -> i64 {
    task.sequence.unwrap_or(MISSING_RANK)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Done,
}

impl StatusFilter {
    pub fn matches(self, status: TaskStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => status == TaskStatus::Pending,
            StatusFilter::Done => status == TaskStatus::Done,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "pending" => Ok(StatusFilter::Pending),
            "done" => Ok(StatusFilter::Done),
            other => Err(Error::InvalidArgument(format!(
                "unknown status filter '{other}' (expected all|pending|done)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GroupFilter {
    #[default]
    All,
    Named(String),
}

impl GroupFilter {
    /// Only the `"All Groups"` label and blank input select every group;
    /// anything else, including a group literally named "All", matches exactly
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == ALL_GROUPS {
            GroupFilter::All
        } else {
            GroupFilter::Named(trimmed.to_string())
        }
    }

    pub fn matches(&self, group: &str) -> bool {
        match self {
            GroupFilter::All => true,
            GroupFilter::Named(name) => name == group,
        }
    }
}

fn deserialize_created_at<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid created_at '{raw}'")))
}

/// Parse an RFC 3339 timestamp, or a naive ISO timestamp read as UTC
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str) -> Task {
        Task {
            id: id.to_string(),
            title: "Title".to_string(),
            group: "General".to_string(),
            due_date: NaiveDate::from_ymd_opt(2025, 1, 10),
            priority: Some(Priority::Normal),
            sequence: Some(1),
            status: TaskStatus::Pending,
            created_at: Utc::now(),
            depends_on: None,
        }
    }

    #[test]
    fn title_case_matches_word_boundaries() {
        assert_eq!(title_case("home office"), "Home Office");
        assert_eq!(title_case("WORK"), "Work");
        assert_eq!(title_case("o'neil"), "O'Neil");
        assert_eq!(title_case("side-project"), "Side-Project");
        assert_eq!(title_case("q3 goals"), "Q3 Goals");
        assert_eq!(title_case("a中b"), "A中B");
        assert_eq!(title_case("ÉCOLE été"), "École Été");
    }

    #[test]
    fn normalize_group_uses_default_when_blank() {
        assert_eq!(normalize_group(None, "General"), "General");
        assert_eq!(normalize_group(Some("   "), "personal"), "Personal");
        assert_eq!(normalize_group(Some("  errands "), "General"), "Errands");
    }

    #[test]
    fn validate_title_trims_and_rejects_blank() {
        assert_eq!(validate_title("  Buy milk ").expect("title"), "Buy milk");
        assert!(matches!(validate_title(" \t\n"), Err(Error::EmptyTitle)));
    }

    #[test]
    fn sort_key_parses_variants() {
        assert_eq!("due_date".parse::<SortKey>().expect("key"), SortKey::DueDate);
        assert_eq!("Created-At".parse::<SortKey>().expect("key"), SortKey::CreatedAt);
        assert!("title".parse::<SortKey>().is_err());
    }

    #[test]
    fn status_filter_is_case_insensitive() {
        assert_eq!("Pending".parse::<StatusFilter>().expect("filter"), StatusFilter::Pending);
        assert_eq!("DONE".parse::<StatusFilter>().expect("filter"), StatusFilter::Done);
        assert_eq!("All".parse::<StatusFilter>().expect("filter"), StatusFilter::All);
        assert!("closed".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn group_filter_all_groups_label() {
        assert_eq!(GroupFilter::parse("All Groups"), GroupFilter::All);
        assert_eq!(GroupFilter::parse(""), GroupFilter::All);
        assert_eq!(
            GroupFilter::parse("All"),
            GroupFilter::Named("All".to_string())
        );
        let named = GroupFilter::parse("Work");
        assert!(named.matches("Work"));
        assert!(!named.matches("work"));
    }

    #[test]
    fn missing_keys_sort_last() {
        let mut missing = task("a");
        missing.due_date = None;
        missing.priority = None;
        missing.sequence = None;
        let present = task("b");

        assert_eq!(SortKey::DueDate.compare(&missing, &present), Ordering::Greater);
        assert_eq!(SortKey::Priority.compare(&missing, &present), Ordering::Greater);
        assert_eq!(SortKey::Sequence.compare(&missing, &present), Ordering::Greater);
    }

    #[test]
    fn serializes_title_as_task_field() {
        let value = serde_json::to_value(task("abc")).expect("json");
        assert_eq!(value["task"], "Title");
        assert_eq!(value["status"], "pending");
        assert_eq!(value["priority"], "normal");
        assert_eq!(value["due_date"], "2025-01-10");
        assert!(value["depends_on"].is_null());
        assert!(value.get("title").is_none());
    }

    #[test]
    fn deserializes_naive_created_at() {
        let raw = r#"{
            "id": "1234",
            "task": "Legacy",
            "group": "Personal",
            "due_date": "2025-01-10",
            "priority": "normal",
            "sequence": 3,
            "status": "done",
            "created_at": "2025-01-01T09:30:00.123456",
            "depends_on": null
        }"#;
        let task: Task = serde_json::from_str(raw).expect("task");
        assert_eq!(task.title, "Legacy");
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.created_at.to_rfc3339(), "2025-01-01T09:30:00.123456+00:00");
    }

    #[test]
    fn dependency_label_uses_short_id() {
        let task = task("abcdef0123");
        assert_eq!(task.dependency_label(), "Title [General] (ID: abcdef...)");
    }
}
