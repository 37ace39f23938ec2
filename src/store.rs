//! Task store: the reducer plus persistence and id/time assignment.
//!
//! Every change goes through [`TaskStore::dispatch`]: the pure transition in
//! [`crate::task::reduce`] runs first, then, when the task list actually
//! changed, the whole list is written under the `"todos"` key. A failed
//! write is logged and reported on the [`ActionOutcome`]; the in-memory
//! state keeps the change.
//!
//! Stored data that cannot be decoded is never overwritten in place: hydrate
//! copies it to a `todos-corrupt-<timestamp>` key first, and if that copy
//! fails every later write is refused.

use std::sync::Arc;

use serde::Serialize;

use crate::clock::Clock;
use crate::config::TasksConfig;
use crate::error::{Error, Result};
use crate::storage::{Storage, TODOS_KEY};
use crate::task::{
    self, Filter, SortMode, Task, TaskAction, TaskDraft, TaskState, ViewState,
};
use crate::view::{self, EmptyState, TabCounts};

/// Result of one dispatched action
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionOutcome {
    /// Whether the task list changed
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    /// Set when the change could not be persisted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug)]
pub struct TaskStore {
    state: TaskState,
    storage: Storage,
    clock: Arc<dyn Clock>,
    config: TasksConfig,
    /// Set when unreadable stored tasks could not be set aside
    persist_blocked: bool,
}

impl TaskStore {
    pub fn new(storage: Storage, clock: Arc<dyn Clock>, config: TasksConfig) -> Self {
        Self {
            state: TaskState::default(),
            storage,
            clock,
            config,
            persist_blocked: false,
        }
    }

    /// Load the persisted task list into memory.
    ///
    /// Missing data means an empty list. Data that does not decode is moved
    /// to a backup key and the list starts empty; the returned warning names
    /// the backup. When the stored value cannot be read or moved, the list
    /// starts empty and persistence stays off for this store.
    pub fn hydrate(&mut self) -> Option<String> {
        self.persist_blocked = false;
        let (tasks, warning) = match self.storage.load_tasks() {
            Ok(tasks) => (tasks.unwrap_or_default(), None),
            Err(Error::Json(err)) => {
                tracing::warn!(%err, "stored tasks do not decode");
                (Vec::new(), Some(self.set_aside_unreadable(&err.to_string())))
            }
            Err(err) => {
                tracing::warn!(%err, "cannot read stored tasks");
                self.persist_blocked = true;
                let warning = format!("stored tasks unreadable ({err}); changes will not be saved");
                (Vec::new(), Some(warning))
            }
        };
        tracing::debug!(count = tasks.len(), "restored tasks");
        self.state = task::reduce(&self.state, TaskAction::Load(tasks));
        warning
    }

    /// Copy the raw `"todos"` value to a timestamped key and clear the
    /// original, so the next write cannot destroy it
    fn set_aside_unreadable(&mut self, reason: &str) -> String {
        let backup = format!(
            "{TODOS_KEY}-corrupt-{}",
            self.clock.now().format("%Y%m%dT%H%M%S%3fZ")
        );
        let moved = self.storage.get(TODOS_KEY).and_then(|raw| {
            if let Some(raw) = raw {
                self.storage.set(&backup, &raw)?;
            }
            self.storage.clear_tasks()
        });

        match moved {
            Ok(()) => {
                tracing::warn!(backup = %backup, "moved unreadable tasks aside");
                format!("stored tasks were unreadable ({reason}); moved them to '{backup}'")
            }
            Err(err) => {
                tracing::warn!(%err, "failed to move unreadable tasks aside");
                self.persist_blocked = true;
                format!("stored tasks unreadable ({reason}) and could not be backed up ({err}); changes will not be saved")
            }
        }
    }

    pub fn state(&self) -> &TaskState {
        &self.state
    }

    pub fn tasks(&self) -> &[Task] {
        &self.state.tasks
    }

    pub fn view_state(&self) -> &ViewState {
        &self.state.view
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.state.find(id)
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Apply `action`, then persist the task list if it changed
    pub fn dispatch(&mut self, action: TaskAction) -> ActionOutcome {
        let name = action.name();
        let touches_tasks = action.touches_tasks();
        let next = task::reduce(&self.state, action);
        let changed = touches_tasks && next.tasks != self.state.tasks;
        self.state = next;

        tracing::debug!(action = name, changed, "dispatched task action");

        let warning = if changed { self.persist() } else { None };
        ActionOutcome {
            changed,
            task_id: None,
            warning,
        }
    }

    fn persist(&self) -> Option<String> {
        if self.persist_blocked {
            tracing::warn!("not persisting tasks over unreadable stored data");
            return Some("tasks not saved: stored tasks are unreadable".to_string());
        }
        match self.storage.save_tasks(&self.state.tasks) {
            Ok(()) => None,
            Err(err) => {
                tracing::warn!(%err, "failed to persist tasks");
                Some(format!("tasks not saved: {err}"))
            }
        }
    }

    fn next_id(&self) -> String {
        loop {
            let id = ulid::Ulid::new().to_string();
            if !self.state.contains(&id) {
                return id;
            }
        }
    }

    /// Create an open task from `draft`, stamped with the current time
    pub fn add_task(&mut self, draft: TaskDraft) -> ActionOutcome {
        let id = self.next_id();
        let task = draft.into_task(id.clone(), self.clock.now());
        ActionOutcome {
            task_id: Some(id),
            ..self.dispatch(TaskAction::Add(task))
        }
    }

    /// Replace the stored task with the same id, refreshing `updated_at`
    pub fn update_task(&mut self, mut task: Task) -> ActionOutcome {
        task.updated_at = self.clock.now();
        let id = task.id.clone();
        ActionOutcome {
            task_id: Some(id),
            ..self.dispatch(TaskAction::Update(task))
        }
    }

    pub fn delete_task(&mut self, id: &str) -> ActionOutcome {
        ActionOutcome {
            task_id: Some(id.to_string()),
            ..self.dispatch(TaskAction::Delete(id.to_string()))
        }
    }

    pub fn toggle_task(&mut self, id: &str) -> ActionOutcome {
        let at = self.clock.now();
        ActionOutcome {
            task_id: Some(id.to_string()),
            ..self.dispatch(TaskAction::Toggle {
                id: id.to_string(),
                at,
            })
        }
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.dispatch(TaskAction::SetFilter(filter));
    }

    pub fn set_sort(&mut self, sort: SortMode) {
        self.dispatch(TaskAction::SetSort(sort));
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.dispatch(TaskAction::SetSearch(query.into()));
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.dispatch(TaskAction::SetLoading(loading));
    }

    /// Replace the whole task list
    pub fn load_tasks(&mut self, tasks: Vec<Task>) -> ActionOutcome {
        self.dispatch(TaskAction::Load(tasks))
    }

    /// Drop in-memory tasks and view state without touching storage
    pub fn reset(&mut self) {
        self.state = TaskState::default();
        self.persist_blocked = false;
    }

    pub fn is_loading(&self) -> bool {
        self.state.view.is_loading
    }

    /// Simulated sync: raise the loading flag for the refresh delay.
    /// Task data is left as is.
    pub async fn refresh(&mut self) {
        let delay = self.config.refresh_delay();
        let _loading = Loading::start(self);
        tokio::time::sleep(delay).await;
    }

    /// Filtered, searched and sorted tasks for the current view
    pub fn view(&self) -> Vec<&Task> {
        view::visible_tasks(&self.state)
    }

    pub fn counts(&self) -> TabCounts {
        view::tab_counts(&self.state.tasks)
    }

    pub fn empty_state(&self) -> EmptyState {
        EmptyState::for_view(&self.state.view)
    }

    /// Resolve a full id or unique prefix against the current tasks
    pub fn resolve_id(&self, input: &str) -> Result<String> {
        task::resolve_task_id(&self.state.tasks, input)
    }
}

/// Keeps the loading flag up until dropped, including when a refresh is
/// cancelled mid-delay
struct Loading<'a> {
    store: &'a mut TaskStore,
}

impl<'a> Loading<'a> {
    fn start(store: &'a mut TaskStore) -> Self {
        store.set_loading(true);
        Self { store }
    }
}

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        self.store.set_loading(false);
    }
}
