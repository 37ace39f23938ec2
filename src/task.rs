//! Task model and the task state transition function.
//!
//! All changes to the task list and view state go through [`reduce`], which
//! takes the current [`TaskState`] and a [`TaskAction`] and returns a fresh
//! state. It performs no I/O and reads no clock: ids and timestamps are
//! decided by the caller and travel inside the action.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Open,
    Complete,
}

impl TaskStatus {
    pub fn toggled(self) -> Self {
        match self {
            TaskStatus::Open => TaskStatus::Complete,
            TaskStatus::Complete => TaskStatus::Open,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Open => "open",
            TaskStatus::Complete => "complete",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted task record.
///
/// Field names are camelCase on disk (`dueDate`, `createdAt`, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User-entered fields of a task that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub due_date: NaiveDate,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, description: impl Into<String>, due_date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            due_date,
        }
    }

    /// Materialize an open task created at `now`.
    pub fn into_task(self, id: String, now: DateTime<Utc>) -> Task {
        Task {
            id,
            title: self.title,
            description: self.description,
            due_date: self.due_date,
            status: TaskStatus::Open,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Open,
    Complete,
}

impl Filter {
    pub const ALL: [Filter; 3] = [Filter::All, Filter::Open, Filter::Complete];

    pub fn matches(self, status: TaskStatus) -> bool {
        match self {
            Filter::All => true,
            Filter::Open => status == TaskStatus::Open,
            Filter::Complete => status == TaskStatus::Complete,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Open => "open",
            Filter::Complete => "complete",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Filter::All => "All",
            Filter::Open => "Open",
            Filter::Complete => "Complete",
        }
    }
}

impl FromStr for Filter {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Filter::All),
            "open" => Ok(Filter::Open),
            "complete" | "completed" | "done" => Ok(Filter::Complete),
            other => Err(Error::InvalidArgument(format!(
                "unknown filter '{other}' (expected all|open|complete)"
            ))),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    #[default]
    DueDate,
    CreatedAt,
    Title,
}

impl SortMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::DueDate => "due_date",
            SortMode::CreatedAt => "created_at",
            SortMode::Title => "title",
        }
    }
}

impl FromStr for SortMode {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "due_date" | "duedate" | "due" => Ok(SortMode::DueDate),
            "created_at" | "createdat" | "created" => Ok(SortMode::CreatedAt),
            "title" => Ok(SortMode::Title),
            other => Err(Error::InvalidArgument(format!(
                "unknown sort '{other}' (expected due-date|created-at|title)"
            ))),
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// UI-facing flags; reset on every start, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ViewState {
    pub filter: Filter,
    pub sort: SortMode,
    pub search_query: String,
    pub is_loading: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskState {
    /// Newest first by insertion.
    pub tasks: Vec<Task>,
    pub view: ViewState,
}

impl TaskState {
    pub fn find(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskAction {
    Add(Task),
    Update(Task),
    Delete(String),
    Toggle { id: String, at: DateTime<Utc> },
    SetFilter(Filter),
    SetSort(SortMode),
    SetSearch(String),
    SetLoading(bool),
    Load(Vec<Task>),
}

impl TaskAction {
    /// Whether the action can change the task list (and so needs persisting).
    pub fn touches_tasks(&self) -> bool {
        matches!(
            self,
            TaskAction::Add(_)
                | TaskAction::Update(_)
                | TaskAction::Delete(_)
                | TaskAction::Toggle { .. }
                | TaskAction::Load(_)
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            TaskAction::Add(_) => "add",
            TaskAction::Update(_) => "update",
            TaskAction::Delete(_) => "delete",
            TaskAction::Toggle { .. } => "toggle",
            TaskAction::SetFilter(_) => "set_filter",
            TaskAction::SetSort(_) => "set_sort",
            TaskAction::SetSearch(_) => "set_search",
            TaskAction::SetLoading(_) => "set_loading",
            TaskAction::Load(_) => "load",
        }
    }
}

/// Apply `action` to `state`, returning the next state.
///
/// Unknown ids make update/delete/toggle a no-op. An add whose id is already
/// present is dropped, and a load keeps the first task for each id, so ids
/// stay unique whatever the caller sends.
pub fn reduce(state: &TaskState, action: TaskAction) -> TaskState {
    let mut next = state.clone();
    match action {
        TaskAction::Add(task) => {
            if !state.contains(&task.id) {
                next.tasks.insert(0, task);
            }
        }
        TaskAction::Update(task) => {
            if let Some(slot) = next.tasks.iter_mut().find(|existing| existing.id == task.id) {
                let created_at = slot.created_at;
                *slot = Task {
                    created_at,
                    updated_at: task.updated_at.max(created_at),
                    ..task
                };
            }
        }
        TaskAction::Delete(id) => {
            next.tasks.retain(|task| task.id != id);
        }
        TaskAction::Toggle { id, at } => {
            if let Some(task) = next.tasks.iter_mut().find(|task| task.id == id) {
                task.status = task.status.toggled();
                task.updated_at = at.max(task.created_at);
            }
        }
        TaskAction::SetFilter(filter) => next.view.filter = filter,
        TaskAction::SetSort(sort) => next.view.sort = sort,
        TaskAction::SetSearch(query) => next.view.search_query = query,
        TaskAction::SetLoading(loading) => next.view.is_loading = loading,
        TaskAction::Load(tasks) => {
            let mut seen = HashSet::new();
            next.tasks = tasks
                .into_iter()
                .filter(|task| seen.insert(task.id.clone()))
                .collect();
        }
    }
    next
}

/// Resolve a full id or unique id prefix against `tasks`.
///
/// An input matching nothing comes back unchanged; callers pass it on and
/// the store treats it as a no-op.
pub fn resolve_task_id(tasks: &[Task], input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidArgument("task id cannot be empty".to_string()));
    }
    let needle = trimmed.to_ascii_lowercase();

    if let Some(task) = tasks
        .iter()
        .find(|task| task.id.to_ascii_lowercase() == needle)
    {
        return Ok(task.id.clone());
    }

    let mut matches: Vec<&str> = tasks
        .iter()
        .filter(|task| task.id.to_ascii_lowercase().starts_with(&needle))
        .map(|task| task.id.as_str())
        .collect();
    matches.sort_unstable();
    matches.dedup();

    match matches.as_slice() {
        [] => Ok(trimmed.to_string()),
        [only] => Ok((*only).to_string()),
        many => Err(Error::InvalidArgument(format!(
            "ambiguous task id '{}': {}",
            trimmed,
            many.join(", ")
        ))),
    }
}
