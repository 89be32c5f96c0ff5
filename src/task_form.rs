//! The create/edit form. One session at a time: opened empty (create mode) or
//! from an existing task (edit mode), closed by submit or cancel.

use std::fmt;

use thiserror::Error;
use tracing::{debug, info};

use crate::error::ParseEnumError;
use crate::task::{DueDate, Task, TaskFields, TaskId, TaskPriority, TaskStatus};
use crate::task_store::TaskStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Description,
    Status,
    Priority,
    Assignee,
    DueDate,
}

impl Field {
    /// Display order in the form.
    pub const ALL: [Field; 6] = [
        Field::Title,
        Field::Description,
        Field::Status,
        Field::Priority,
        Field::Assignee,
        Field::DueDate,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::Title => "Title",
            Field::Description => "Description",
            Field::Status => "Status",
            Field::Priority => "Priority",
            Field::Assignee => "Assignee",
            Field::DueDate => "Due Date",
        }
    }

    pub fn is_required(self) -> bool {
        !matches!(self, Field::Description)
    }

    /// Status and priority are picked from a fixed set, the rest are typed.
    pub fn is_text(self) -> bool {
        !matches!(self, Field::Status | Field::Priority)
    }

    pub fn next(self) -> Field {
        step(&Field::ALL, self, true)
    }

    pub fn prev(self) -> Field {
        step(&Field::ALL, self, false)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn step<T: Copy + PartialEq>(all: &[T], current: T, forward: bool) -> T {
    let len = all.len();
    let index = all.iter().position(|item| *item == current).unwrap_or(0);
    let next = if forward {
        (index + 1) % len
    } else {
        (index + len - 1) % len
    };
    all[next]
}

/// Unsaved field values. `due_date` is the plain `YYYY-MM-DD` text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assignee: String,
    pub due_date: String,
}

impl Draft {
    fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            priority: task.priority,
            assignee: task.assignee.clone(),
            due_date: task.due_date.to_date_string(),
        }
    }

    fn text_mut(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::Title => Some(&mut self.title),
            Field::Description => Some(&mut self.description),
            Field::Assignee => Some(&mut self.assignee),
            Field::DueDate => Some(&mut self.due_date),
            Field::Status | Field::Priority => None,
        }
    }

    /// The value shown for `field` in the form.
    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.title,
            Field::Description => &self.description,
            Field::Status => self.status.label(),
            Field::Priority => self.priority.label(),
            Field::Assignee => &self.assignee,
            Field::DueDate => &self.due_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(TaskId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FormSession {
    draft: Draft,
    mode: FormMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("no task form is open")]
    Closed,
    #[error("{0} is required")]
    MissingField(Field),
    #[error("due date {0:?} is not a valid YYYY-MM-DD date")]
    InvalidDueDate(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submitted {
    Created(TaskId),
    /// `applied` is false when the task vanished while the form was open.
    Updated { id: TaskId, applied: bool },
}

#[derive(Debug, Default)]
pub struct TaskForm {
    session: Option<FormSession>,
}

impl TaskForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a session, replacing any draft already in progress.
    pub fn open(&mut self, initial: Option<&Task>) {
        let session = match initial {
            Some(task) => FormSession {
                draft: Draft::from_task(task),
                mode: FormMode::Edit(task.id.clone()),
            },
            None => FormSession {
                draft: Draft::default(),
                mode: FormMode::Create,
            },
        };
        debug!(mode = ?session.mode, "opened task form");
        self.session = Some(session);
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn mode(&self) -> Option<&FormMode> {
        self.session.as_ref().map(|session| &session.mode)
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.session.as_ref().map(|session| &session.draft)
    }

    fn draft_mut(&mut self) -> Option<&mut Draft> {
        self.session.as_mut().map(|session| &mut session.draft)
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        if let Some(draft) = self.draft_mut() {
            draft.title = title.into();
        }
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        if let Some(draft) = self.draft_mut() {
            draft.description = description.into();
        }
    }

    pub fn set_status(&mut self, status: TaskStatus) {
        if let Some(draft) = self.draft_mut() {
            draft.status = status;
        }
    }

    pub fn set_priority(&mut self, priority: TaskPriority) {
        if let Some(draft) = self.draft_mut() {
            draft.priority = priority;
        }
    }

    pub fn set_assignee(&mut self, assignee: impl Into<String>) {
        if let Some(draft) = self.draft_mut() {
            draft.assignee = assignee.into();
        }
    }

    pub fn set_due_date(&mut self, due_date: impl Into<String>) {
        if let Some(draft) = self.draft_mut() {
            draft.due_date = due_date.into();
        }
    }

    /// Sets the status from its wire string. Unknown values leave the draft as is.
    pub fn set_status_str(&mut self, value: &str) -> Result<(), ParseEnumError> {
        let status = value.parse()?;
        self.set_status(status);
        Ok(())
    }

    /// Sets the priority from its wire string. Unknown values leave the draft as is.
    pub fn set_priority_str(&mut self, value: &str) -> Result<(), ParseEnumError> {
        let priority = value.parse()?;
        self.set_priority(priority);
        Ok(())
    }

    pub fn push_char(&mut self, field: Field, c: char) {
        if let Some(text) = self.draft_mut().and_then(|draft| draft.text_mut(field)) {
            text.push(c);
        }
    }

    pub fn pop_char(&mut self, field: Field) {
        if let Some(text) = self.draft_mut().and_then(|draft| draft.text_mut(field)) {
            text.pop();
        }
    }

    /// Steps an enum field to its next (or previous) value, wrapping around.
    pub fn cycle(&mut self, field: Field, forward: bool) {
        let Some(draft) = self.draft_mut() else {
            return;
        };
        match field {
            Field::Status => draft.status = step(&TaskStatus::ALL, draft.status, forward),
            Field::Priority => draft.priority = step(&TaskPriority::ALL, draft.priority, forward),
            _ => {}
        }
    }

    /// Builds the output record, refusing drafts with an empty required field.
    pub fn fields(&self) -> Result<TaskFields, FormError> {
        let draft = self.draft().ok_or(FormError::Closed)?;
        for (field, value) in [
            (Field::Title, &draft.title),
            (Field::Assignee, &draft.assignee),
            (Field::DueDate, &draft.due_date),
        ] {
            if value.is_empty() {
                return Err(FormError::MissingField(field));
            }
        }
        let due_date = DueDate::parse_plain(&draft.due_date)
            .ok_or_else(|| FormError::InvalidDueDate(draft.due_date.clone()))?;

        Ok(TaskFields {
            title: draft.title.clone(),
            description: draft.description.clone(),
            status: draft.status,
            priority: draft.priority,
            assignee: draft.assignee.clone(),
            due_date,
        })
    }

    /// Hands the draft to the store and closes the session. A rejected draft
    /// keeps the session open and the store untouched.
    pub fn submit(&mut self, store: &mut TaskStore) -> Result<Submitted, FormError> {
        let fields = self.fields()?;
        let session = self.session.take().ok_or(FormError::Closed)?;
        let outcome = match session.mode {
            FormMode::Create => Submitted::Created(store.create(fields)),
            FormMode::Edit(id) => {
                let applied = store.update(&id, fields.into());
                if store.editing().is_some_and(|task| task.id == id) {
                    store.end_edit();
                }
                Submitted::Updated { id, applied }
            }
        };
        info!(?outcome, "submitted task form");
        Ok(outcome)
    }

    pub fn cancel(&mut self) {
        if self.session.take().is_some() {
            debug!("cancelled task form");
        }
    }
}
