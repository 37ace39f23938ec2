//! Derived, read-only views over a [`TaskState`].
//!
//! Nothing here is stored; callers recompute on every read.

use std::cmp::Ordering;

use chrono::NaiveDate;
use icu_collator::{Collator, CollatorOptions, Strength};
use serde::Serialize;

use crate::task::{Filter, SortMode, Task, TaskState, TaskStatus, ViewState};

pub fn matches_search(task: &Task, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let needle = query.to_lowercase();
    task.title.to_lowercase().contains(&needle) || task.description.to_lowercase().contains(&needle)
}

/// Tasks passing the active filter and search, ordered by the active sort.
///
/// The sort is stable, so ties keep the order of the underlying list.
pub fn visible_tasks(state: &TaskState) -> Vec<&Task> {
    let view = &state.view;
    let mut visible: Vec<&Task> = state
        .tasks
        .iter()
        .filter(|task| view.filter.matches(task.status) && matches_search(task, &view.search_query))
        .collect();
    let titles = TitleCollator::new();
    visible.sort_by(|left, right| compare_tasks(left, right, view.sort, &titles));
    visible
}

pub fn compare_tasks(left: &Task, right: &Task, sort: SortMode, titles: &TitleCollator) -> Ordering {
    match sort {
        SortMode::DueDate => left.due_date.cmp(&right.due_date),
        SortMode::CreatedAt => right.created_at.cmp(&left.created_at),
        SortMode::Title => titles.compare(&left.title, &right.title),
    }
}

/// Locale-aware title ordering.
///
/// Root-locale collation at tertiary strength: base letters first, so
/// accented and differently-cased titles sit next to their plain forms, then
/// accents, then lowercase before uppercase.
pub struct TitleCollator {
    collator: Option<Collator>,
}

impl TitleCollator {
    pub fn new() -> Self {
        let mut options = CollatorOptions::new();
        options.strength = Some(Strength::Tertiary);
        let collator = match Collator::try_new(&Default::default(), options) {
            Ok(collator) => Some(collator),
            Err(err) => {
                tracing::warn!(?err, "title collation unavailable, comparing case-folded text");
                None
            }
        };
        Self { collator }
    }

    pub fn compare(&self, left: &str, right: &str) -> Ordering {
        match &self.collator {
            Some(collator) => collator.compare(left, right),
            None => left
                .to_lowercase()
                .cmp(&right.to_lowercase())
                .then_with(|| right.cmp(left)),
        }
    }
}

impl Default for TitleCollator {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-tab badge counts. Reflect status only, never the search text or the
/// selected filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TabCounts {
    pub all: usize,
    pub open: usize,
    pub complete: usize,
}

impl TabCounts {
    pub fn get(&self, filter: Filter) -> usize {
        match filter {
            Filter::All => self.all,
            Filter::Open => self.open,
            Filter::Complete => self.complete,
        }
    }
}

pub fn tab_counts(tasks: &[Task]) -> TabCounts {
    let open = tasks
        .iter()
        .filter(|task| task.status == TaskStatus::Open)
        .count();
    TabCounts {
        all: tasks.len(),
        open,
        complete: tasks.len() - open,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DueState {
    /// Due before today and still open.
    Overdue,
    DueToday,
    Upcoming,
}

pub fn due_state(task: &Task, today: NaiveDate) -> DueState {
    if task.due_date < today && task.status == TaskStatus::Open {
        DueState::Overdue
    } else if task.due_date == today {
        DueState::DueToday
    } else {
        DueState::Upcoming
    }
}

/// "Today", "Tomorrow", or a short month/day such as "Jun 1".
pub fn due_label(due: NaiveDate, today: NaiveDate) -> String {
    if due == today {
        return "Today".to_string();
    }
    if today.succ_opt() == Some(due) {
        return "Tomorrow".to_string();
    }
    due.format("%b %-d").to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyState {
    NoMatches,
    NoTasks,
}

impl EmptyState {
    pub fn for_view(view: &ViewState) -> Self {
        if view.search_query.is_empty() {
            EmptyState::NoTasks
        } else {
            EmptyState::NoMatches
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            EmptyState::NoMatches => "No tasks found",
            EmptyState::NoTasks => "No tasks yet",
        }
    }

    pub fn hint(self) -> &'static str {
        match self {
            EmptyState::NoMatches => "Try adjusting your search terms or create a new task",
            EmptyState::NoTasks => "Get started by creating your first task",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{reduce, TaskAction, TaskDraft};
    use chrono::{DateTime, TimeZone, Utc};

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, month, day).unwrap()
    }

    fn created(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 12, minute, 0).unwrap()
    }

    fn task(id: &str, title: &str, description: &str, due: NaiveDate, minute: u32) -> Task {
        TaskDraft::new(title, description, due).into_task(id.to_string(), created(minute))
    }

    fn sample() -> TaskState {
        let mut done = task("c", "pay rent", "", date(6, 1), 3);
        done.status = TaskStatus::Complete;
        reduce(
            &TaskState::default(),
            TaskAction::Load(vec![
                task("a", "Buy Milk", "2 litres", date(6, 3), 1),
                task("b", "Call mom", "about the MILKSHAKE recipe", date(6, 2), 2),
                done,
                task("d", "apple pie", "", date(6, 2), 4),
            ]),
        )
    }

    fn ids(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|task| task.id.clone()).collect()
    }

    #[test]
    fn default_view_sorts_by_due_date_with_stable_ties() {
        let state = sample();
        assert_eq!(ids(&visible_tasks(&state)), vec!["c", "b", "d", "a"]);
    }

    #[test]
    fn search_is_case_insensitive_over_title_and_description() {
        let state = reduce(&sample(), TaskAction::SetSearch("milk".to_string()));
        assert_eq!(ids(&visible_tasks(&state)), vec!["b", "a"]);

        let state = reduce(&sample(), TaskAction::SetSearch("LITRES".to_string()));
        assert_eq!(ids(&visible_tasks(&state)), vec!["a"]);
    }

    #[test]
    fn filter_and_search_must_both_pass() {
        let mut state = reduce(&sample(), TaskAction::SetFilter(Filter::Complete));
        assert_eq!(ids(&visible_tasks(&state)), vec!["c"]);

        state = reduce(&state, TaskAction::SetSearch("milk".to_string()));
        assert!(visible_tasks(&state).is_empty());
    }

    #[test]
    fn created_at_sort_is_newest_first() {
        let state = reduce(&sample(), TaskAction::SetSort(SortMode::CreatedAt));
        assert_eq!(ids(&visible_tasks(&state)), vec!["d", "c", "b", "a"]);
    }

    #[test]
    fn title_sort_ignores_case() {
        let state = reduce(&sample(), TaskAction::SetSort(SortMode::Title));
        let titles: Vec<&str> = visible_tasks(&state)
            .iter()
            .map(|task| task.title.as_str())
            .collect();
        assert_eq!(titles, vec!["apple pie", "Buy Milk", "Call mom", "pay rent"]);

        let collator = TitleCollator::new();
        assert_eq!(collator.compare("a", "A"), Ordering::Less);
        assert_eq!(collator.compare("Zed", "alpha"), Ordering::Greater);
        assert_eq!(collator.compare("Émile", "Zoe"), Ordering::Less);
        assert_eq!(collator.compare("éclair", "fig"), Ordering::Less);
        assert_eq!(collator.compare("eclair", "éclair"), Ordering::Less);
    }

    #[test]
    fn title_sort_places_accented_titles_with_their_base_letter() {
        let state = reduce(
            &TaskState::default(),
            TaskAction::Load(vec![
                task("z", "Zoe", "", date(6, 1), 1),
                task("e", "Émile", "", date(6, 1), 2),
                task("f", "fig", "", date(6, 1), 3),
                task("c", "éclair", "", date(6, 1), 4),
            ]),
        );
        let state = reduce(&state, TaskAction::SetSort(SortMode::Title));
        assert_eq!(ids(&visible_tasks(&state)), vec!["c", "e", "f", "z"]);
    }

    #[test]
    fn counts_ignore_search_and_filter() {
        let mut state = reduce(&sample(), TaskAction::SetSearch("milk".to_string()));
        state = reduce(&state, TaskAction::SetFilter(Filter::Open));
        let counts = tab_counts(&state.tasks);
        assert_eq!(
            counts,
            TabCounts {
                all: 4,
                open: 3,
                complete: 1
            }
        );
        assert_eq!(counts.get(Filter::Complete), 1);
        assert_eq!(counts.open + counts.complete, counts.all);
    }

    #[test]
    fn due_labels_and_states() {
        let today = date(6, 2);
        assert_eq!(due_label(date(6, 2), today), "Today");
        assert_eq!(due_label(date(6, 3), today), "Tomorrow");
        assert_eq!(due_label(date(6, 1), today), "Jun 1");
        assert_eq!(due_label(date(12, 25), today), "Dec 25");

        let state = sample();
        assert_eq!(due_state(state.find("a").unwrap(), today), DueState::Upcoming);
        assert_eq!(due_state(state.find("b").unwrap(), today), DueState::DueToday);
        let mut late = state.find("a").unwrap().clone();
        late.due_date = date(5, 30);
        assert_eq!(due_state(&late, today), DueState::Overdue);
        assert_eq!(due_state(state.find("c").unwrap(), today), DueState::Upcoming);
    }

    #[test]
    fn empty_state_depends_on_search() {
        let mut view = ViewState::default();
        assert_eq!(EmptyState::for_view(&view), EmptyState::NoTasks);
        view.search_query = "x".to_string();
        let empty = EmptyState::for_view(&view);
        assert_eq!(empty, EmptyState::NoMatches);
        assert_eq!(empty.title(), "No tasks found");
    }
}
