//! zenith task command implementations.

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::cli::Context;
use crate::error::Result;
use crate::form::TaskForm;
use crate::output::{emit_success, HumanOutput};
use crate::store::{ActionOutcome, TaskStore};
use crate::task::{Filter, SortMode, Task, TaskStatus};
use crate::view::{self, DueState, TabCounts};

pub struct AddOptions {
    pub title: String,
    pub description: String,
    pub due: String,
}

pub struct EditOptions {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub due: Option<String>,
}

pub struct ViewOptions {
    pub filter: Option<String>,
    pub sort: Option<String>,
    pub search: Option<String>,
}

#[derive(Serialize)]
struct TaskReport<'a> {
    #[serde(flatten)]
    task: &'a Task,
    due_label: String,
    due_state: DueState,
}

impl<'a> TaskReport<'a> {
    fn new(task: &'a Task, today: NaiveDate) -> Self {
        Self {
            task,
            due_label: view::due_label(task.due_date, today),
            due_state: view::due_state(task, today),
        }
    }
}

#[derive(Serialize)]
struct MutationReport<'a> {
    id: String,
    changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    task: Option<TaskReport<'a>>,
}

#[derive(Serialize)]
struct ListReport<'a> {
    filter: Filter,
    sort: SortMode,
    search: &'a str,
    counts: TabCounts,
    total: usize,
    tasks: Vec<TaskReport<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    empty: Option<EmptyReport>,
}

#[derive(Serialize)]
struct EmptyReport {
    title: &'static str,
    hint: &'static str,
}

#[derive(Serialize)]
struct CountReport {
    filter: Filter,
    total: usize,
    counts: TabCounts,
}

#[derive(Serialize)]
struct RefreshReport {
    refreshed: bool,
    total: usize,
}

/// Accept `today` / `tomorrow` as shorthands for the form's date format
fn expand_due(raw: &str, today: NaiveDate) -> String {
    let date = match raw.trim().to_ascii_lowercase().as_str() {
        "today" => Some(today),
        "tomorrow" => today.checked_add_days(Days::new(1)),
        _ => None,
    };
    match date {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => raw.to_string(),
    }
}

fn status_marker(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Open => "[ ]",
        TaskStatus::Complete => "[x]",
    }
}

fn task_line(task: &Task, today: NaiveDate) -> String {
    let mut line = format!(
        "{} {} {} (due {})",
        status_marker(task.status),
        task.id,
        task.title,
        view::due_label(task.due_date, today)
    );
    if view::due_state(task, today) == DueState::Overdue {
        line.push_str(" overdue");
    }
    line
}

fn push_outcome(human: &mut HumanOutput, outcome: &ActionOutcome, id: &str) {
    if !outcome.changed {
        human.push_warning(format!("no task with id '{id}'; nothing changed"));
    }
    if let Some(warning) = outcome.warning.as_ref() {
        human.push_warning(warning.clone());
    }
}

fn push_notices(human: &mut HumanOutput, notices: Vec<String>) {
    for notice in notices {
        human.push_warning(notice);
    }
}

fn apply_view(store: &mut TaskStore, options: &ViewOptions) -> Result<()> {
    if let Some(filter) = options.filter.as_deref() {
        store.set_filter(filter.parse()?);
    }
    if let Some(sort) = options.sort.as_deref() {
        store.set_sort(sort.parse()?);
    }
    if let Some(search) = options.search.as_deref() {
        store.set_search(search);
    }
    Ok(())
}

fn counts_line(counts: &TabCounts) -> String {
    Filter::ALL
        .iter()
        .map(|filter| format!("{} {}", filter.label(), counts.get(*filter)))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn run_add(ctx: &Context, options: AddOptions) -> Result<()> {
    let (_lock, mut app) = ctx.open_app()?;
    let notices = app.take_warnings();
    let store = app.tasks_mut()?;
    let today = store.clock().today();

    let draft = TaskForm::new(options.title, options.description, expand_due(&options.due, today))
        .validate()?;
    let outcome = store.add_task(draft);
    let id = outcome.task_id.clone().unwrap_or_default();
    let task = store.get(&id);

    let mut human = HumanOutput::new(format!(
        "zenith task add: {}",
        task.map(|task| task.title.as_str()).unwrap_or_default()
    ));
    human.push_summary("id", id.clone());
    if let Some(task) = task {
        human.push_summary("due", view::due_label(task.due_date, today));
    }
    push_outcome(&mut human, &outcome, &id);
    human.push_next_step("zenith task ls");

    push_notices(&mut human, notices);
    emit_success(
        ctx.output,
        "task add",
        &MutationReport {
            id: id.clone(),
            changed: outcome.changed,
            task: task.map(|task| TaskReport::new(task, today)),
        },
        Some(&human),
    )
}

pub fn run_edit(ctx: &Context, options: EditOptions) -> Result<()> {
    let (_lock, mut app) = ctx.open_app()?;
    let notices = app.take_warnings();
    let store = app.tasks_mut()?;
    let today = store.clock().today();
    let id = store.resolve_id(&options.id)?;

    let outcome = match store.get(&id).cloned() {
        Some(existing) => {
            let mut form = TaskForm::from_task(&existing);
            if let Some(title) = options.title {
                form.title = title;
            }
            if let Some(description) = options.description {
                form.description = description;
            }
            if let Some(due) = options.due.as_deref() {
                form.due_date = expand_due(due, today);
            }
            let edited = form.apply_to(&existing)?;
            store.update_task(edited)
        }
        None => ActionOutcome::default(),
    };
    let task = store.get(&id);

    let mut human = HumanOutput::new(format!("zenith task edit: {id}"));
    if let Some(task) = task {
        human.push_summary("title", task.title.clone());
        human.push_summary("due", view::due_label(task.due_date, today));
    }
    push_outcome(&mut human, &outcome, &id);

    push_notices(&mut human, notices);
    emit_success(
        ctx.output,
        "task edit",
        &MutationReport {
            id: id.clone(),
            changed: outcome.changed,
            task: task.map(|task| TaskReport::new(task, today)),
        },
        Some(&human),
    )
}

pub fn run_toggle(ctx: &Context, input: &str) -> Result<()> {
    let (_lock, mut app) = ctx.open_app()?;
    let notices = app.take_warnings();
    let store = app.tasks_mut()?;
    let today = store.clock().today();
    let id = store.resolve_id(input)?;

    let outcome = store.toggle_task(&id);
    let task = store.get(&id);

    let mut human = HumanOutput::new(match task {
        Some(task) => format!("zenith task toggle: {} is now {}", task.title, task.status),
        None => format!("zenith task toggle: {id}"),
    });
    push_outcome(&mut human, &outcome, &id);

    push_notices(&mut human, notices);
    emit_success(
        ctx.output,
        "task toggle",
        &MutationReport {
            id: id.clone(),
            changed: outcome.changed,
            task: task.map(|task| TaskReport::new(task, today)),
        },
        Some(&human),
    )
}

pub fn run_rm(ctx: &Context, input: &str) -> Result<()> {
    let (_lock, mut app) = ctx.open_app()?;
    let notices = app.take_warnings();
    let store = app.tasks_mut()?;
    let id = store.resolve_id(input)?;
    let title = store.get(&id).map(|task| task.title.clone());

    let outcome = store.delete_task(&id);

    let mut human = HumanOutput::new(match title {
        Some(title) => format!("zenith task rm: deleted {title}"),
        None => format!("zenith task rm: {id}"),
    });
    push_outcome(&mut human, &outcome, &id);

    push_notices(&mut human, notices);
    emit_success(
        ctx.output,
        "task rm",
        &MutationReport {
            id: id.clone(),
            changed: outcome.changed,
            task: None,
        },
        Some(&human),
    )
}

pub fn run_ls(ctx: &Context, options: ViewOptions) -> Result<()> {
    let (_lock, mut app) = ctx.open_app()?;
    let notices = app.take_warnings();
    let store = app.tasks_mut()?;
    apply_view(store, &options)?;
    let store = &*store;

    let today = store.clock().today();
    let view_state = store.view_state();
    let visible = store.view();
    let counts = store.counts();

    let mut human = HumanOutput::new(format!(
        "zenith task ls: {} of {} tasks",
        visible.len(),
        counts.all
    ));
    human.push_summary("tabs", counts_line(&counts));
    human.push_summary("filter", view_state.filter.as_str());
    human.push_summary("sort", view_state.sort.as_str());
    if !view_state.search_query.is_empty() {
        human.push_summary("search", view_state.search_query.clone());
    }

    let empty = if visible.is_empty() {
        let empty = store.empty_state();
        human.push_detail(empty.title());
        human.push_detail(empty.hint());
        Some(EmptyReport {
            title: empty.title(),
            hint: empty.hint(),
        })
    } else {
        for task in &visible {
            human.push_detail(task_line(task, today));
        }
        None
    };

    push_notices(&mut human, notices);
    emit_success(
        ctx.output,
        "task ls",
        &ListReport {
            filter: view_state.filter,
            sort: view_state.sort,
            search: &view_state.search_query,
            counts,
            total: visible.len(),
            tasks: visible
                .iter()
                .map(|task| TaskReport::new(task, today))
                .collect(),
            empty,
        },
        Some(&human),
    )
}

pub fn run_count(ctx: &Context, options: ViewOptions) -> Result<()> {
    let (_lock, mut app) = ctx.open_app()?;
    let notices = app.take_warnings();
    let store = app.tasks_mut()?;
    apply_view(store, &options)?;

    let counts = store.counts();
    let report = CountReport {
        filter: store.view_state().filter,
        total: store.view().len(),
        counts,
    };

    let mut human = HumanOutput::new(report.total.to_string());
    human.push_summary("tabs", counts_line(&counts));

    push_notices(&mut human, notices);
    emit_success(ctx.output, "task count", &report, Some(&human))
}

pub async fn run_refresh(ctx: &Context) -> Result<()> {
    let (_lock, mut app) = ctx.open_app()?;
    let notices = app.take_warnings();
    app.refresh().await?;
    let total = app.tasks()?.tasks().len();

    let mut human = HumanOutput::new("zenith task refresh: up to date");
    human.push_summary("tasks", total.to_string());

    push_notices(&mut human, notices);
    emit_success(
        ctx.output,
        "task refresh",
        &RefreshReport {
            refreshed: true,
            total,
        },
        Some(&human),
    )
}
