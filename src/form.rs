//! Task form validation.
//!
//! This is the only place task fields are checked. The store accepts
//! whatever it is given.

use chrono::NaiveDate;

use crate::error::{Error, FieldError, Result};
use crate::task::{Task, TaskDraft};

pub const TITLE_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// Raw field values as entered by the user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    /// `YYYY-MM-DD`
    pub due_date: String,
}

impl TaskForm {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        due_date: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            due_date: due_date.into(),
        }
    }

    /// Prefill from an existing task, as the edit dialog does
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            due_date: task.due_date.format("%Y-%m-%d").to_string(),
        }
    }

    /// Check every field, collecting all failures
    pub fn validate(&self) -> Result<TaskDraft> {
        let mut errors = Vec::new();

        let title = self.title.trim();
        if title.is_empty() {
            errors.push(FieldError::new("title", "Title is required"));
        } else if title.chars().count() > TITLE_MAX_CHARS {
            errors.push(FieldError::new("title", "Title too long"));
        }

        if self.description.chars().count() > DESCRIPTION_MAX_CHARS {
            errors.push(FieldError::new("description", "Description too long"));
        }

        let due = self.due_date.trim();
        let due_date = if due.is_empty() {
            errors.push(FieldError::new("dueDate", "Due date is required"));
            None
        } else {
            match NaiveDate::parse_from_str(due, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    errors.push(FieldError::new(
                        "dueDate",
                        format!("Due date must be a valid YYYY-MM-DD date (got '{due}')"),
                    ));
                    None
                }
            }
        };

        match due_date {
            Some(due_date) if errors.is_empty() => Ok(TaskDraft::new(
                title,
                self.description.clone(),
                due_date,
            )),
            _ => Err(Error::Validation(errors)),
        }
    }

    /// Validate and merge into `task`, keeping its id, status and timestamps
    pub fn apply_to(&self, task: &Task) -> Result<Task> {
        let draft = self.validate()?;
        Ok(Task {
            title: draft.title,
            description: draft.description,
            due_date: draft.due_date,
            ..task.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskStatus;
    use chrono::{TimeZone, Utc};

    fn field_messages(err: Error) -> Vec<(&'static str, String)> {
        match err {
            Error::Validation(fields) => fields
                .into_iter()
                .map(|field| (field.field, field.message))
                .collect(),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn valid_form_produces_trimmed_draft() {
        let draft = TaskForm::new("  Buy milk ", "2 litres", "2025-06-01")
            .validate()
            .unwrap();
        assert_eq!(draft.title, "Buy milk");
        assert_eq!(draft.description, "2 litres");
        assert_eq!(draft.due_date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
    }

    #[test]
    fn blank_title_and_missing_due_are_reported_together() {
        let err = TaskForm::new("   ", "", "").validate().unwrap_err();
        assert_eq!(
            field_messages(err),
            vec![
                ("title", "Title is required".to_string()),
                ("dueDate", "Due date is required".to_string()),
            ]
        );
    }

    #[test]
    fn length_limits_count_characters() {
        let ok = TaskForm::new("é".repeat(TITLE_MAX_CHARS), "", "2025-06-01");
        assert!(ok.validate().is_ok());

        let err = TaskForm::new(
            "x".repeat(TITLE_MAX_CHARS + 1),
            "d".repeat(DESCRIPTION_MAX_CHARS + 1),
            "2025-06-01",
        )
        .validate()
        .unwrap_err();
        assert_eq!(
            field_messages(err),
            vec![
                ("title", "Title too long".to_string()),
                ("description", "Description too long".to_string()),
            ]
        );
    }

    #[test]
    fn malformed_due_date_is_rejected() {
        let err = TaskForm::new("Pay rent", "", "2025-13-40")
            .validate()
            .unwrap_err();
        let messages = field_messages(err);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, "dueDate");
    }

    #[test]
    fn past_due_dates_are_accepted() {
        assert!(TaskForm::new("Old chore", "", "2001-01-01").validate().is_ok());
    }

    #[test]
    fn apply_to_keeps_identity_fields() {
        let at = Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap();
        let mut task = TaskDraft::new("Draft", "", NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
            .into_task("01x".to_string(), at);
        task.status = TaskStatus::Complete;

        let mut form = TaskForm::from_task(&task);
        assert_eq!(form.due_date, "2025-06-01");
        form.title = "Final".to_string();
        form.due_date = "2025-07-04".to_string();

        let edited = form.apply_to(&task).unwrap();
        assert_eq!(edited.id, "01x");
        assert_eq!(edited.title, "Final");
        assert_eq!(edited.status, TaskStatus::Complete);
        assert_eq!(edited.created_at, at);
        assert_eq!(edited.due_date, NaiveDate::from_ymd_opt(2025, 7, 4).unwrap());
    }
}
