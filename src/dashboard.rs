use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, info};

use crate::task::{Task, TaskId, TaskStatus};
use crate::task_form::{Field, FormError, Submitted, TaskForm};
use crate::task_store::TaskStore;

/// Plain or shifted keys are text; Ctrl and Alt chords are not.
fn typed(modifiers: KeyModifiers) -> bool {
    modifiers.difference(KeyModifiers::SHIFT).is_empty()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// Screen state around the store: which card is selected, whether the form
/// or the delete prompt is up, and what the last rejected submit said.
#[derive(Debug)]
pub struct Dashboard {
    store: TaskStore,
    form: TaskForm,
    focus: Field,
    form_error: Option<FormError>,
    pending_delete: Option<TaskId>,
    selected: usize,
    columns: usize,
}

impl Dashboard {
    pub fn new(store: TaskStore, columns: usize) -> Self {
        Self {
            store,
            form: TaskForm::new(),
            focus: Field::Title,
            form_error: None,
            pending_delete: None,
            selected: 0,
            columns: columns.max(1),
        }
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn form(&self) -> &TaskForm {
        &self.form
    }

    pub fn focus(&self) -> Field {
        self.focus
    }

    pub fn form_error(&self) -> Option<&FormError> {
        self.form_error.as_ref()
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.store.list().get(self.selected)
    }

    /// The task awaiting a yes/no answer before it is deleted.
    pub fn pending_delete(&self) -> Option<&Task> {
        self.pending_delete.as_ref().and_then(|id| self.store.get(id))
    }

    /// Header line, e.g. `4 tasks • 1 completed`.
    pub fn summary(&self) -> String {
        let total = self.store.len();
        let noun = if total == 1 { "task" } else { "tasks" };
        format!(
            "{total} {noun} • {} completed",
            self.store.completed_count()
        )
    }

    pub fn open_create_form(&mut self) {
        self.store.end_edit();
        self.form.open(None);
        self.focus = Field::Title;
        self.form_error = None;
    }

    pub fn open_edit_form(&mut self, id: &TaskId) {
        if let Some(task) = self.store.begin_edit(id) {
            self.form.open(Some(task));
            self.focus = Field::Title;
            self.form_error = None;
        }
    }

    pub fn submit_form(&mut self) {
        match self.form.submit(&mut self.store) {
            Ok(Submitted::Created(_)) => {
                self.form_error = None;
                self.selected = self.store.len().saturating_sub(1);
            }
            Ok(Submitted::Updated { .. }) => self.form_error = None,
            Err(err) => {
                debug!(%err, "form submit rejected");
                self.form_error = Some(err);
            }
        }
    }

    pub fn cancel_form(&mut self) {
        self.form.cancel();
        self.store.end_edit();
        self.form_error = None;
    }

    pub fn request_delete(&mut self, id: &TaskId) {
        if self.store.get(id).is_some() {
            self.pending_delete = Some(id.clone());
        }
    }

    /// Answers the delete prompt. Only a yes reaches the store.
    pub fn confirm_delete(&mut self, confirmed: bool) {
        let Some(id) = self.pending_delete.take() else {
            return;
        };
        if confirmed {
            if self.store.delete(&id) {
                info!(%id, "task deleted");
            }
            self.clamp_selection();
        }
    }

    pub fn complete(&mut self, id: &TaskId) {
        if self.store.mark_complete(id) {
            info!(%id, "task completed");
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Control {
        if self.pending_delete.is_some() {
            self.handle_confirm_key(key);
        } else if self.form.is_open() {
            self.handle_form_key(key);
        } else {
            return self.handle_board_key(key);
        }
        Control::Continue
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y' | 'Y') => self.confirm_delete(true),
            KeyCode::Char('n' | 'N') | KeyCode::Esc => self.confirm_delete(false),
            _ => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.cancel_form(),
            KeyCode::Enter => self.submit_form(),
            KeyCode::Tab | KeyCode::Down => self.focus = self.focus.next(),
            KeyCode::BackTab | KeyCode::Up => self.focus = self.focus.prev(),
            KeyCode::Left if !self.focus.is_text() => self.form.cycle(self.focus, false),
            KeyCode::Right if !self.focus.is_text() => self.form.cycle(self.focus, true),
            KeyCode::Char(' ') if !self.focus.is_text() => self.form.cycle(self.focus, true),
            KeyCode::Backspace => self.form.pop_char(self.focus),
            KeyCode::Char(c) if typed(key.modifiers) => self.form.push_char(self.focus, c),
            _ => {}
        }
    }

    fn handle_board_key(&mut self, key: KeyEvent) -> Control {
        match key.code {
            KeyCode::Char('q') => return Control::Quit,
            KeyCode::Char('n') => self.open_create_form(),
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(id) = self.selected_id() {
                    self.open_edit_form(&id);
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(id) = self.selected_id() {
                    self.request_delete(&id);
                }
            }
            KeyCode::Char('c') => {
                // Done tasks have no complete action.
                if let Some(task) = self.selected_task().filter(|t| t.status != TaskStatus::Done) {
                    let id = task.id.clone();
                    self.complete(&id);
                }
            }
            KeyCode::Left | KeyCode::Char('h') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Right | KeyCode::Char('l') => self.move_selection(1),
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(self.columns);
            }
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(self.columns),
            _ => {}
        }
        Control::Continue
    }

    fn selected_id(&self) -> Option<TaskId> {
        self.selected_task().map(|task| task.id.clone())
    }

    fn move_selection(&mut self, by: usize) {
        let target = self.selected + by;
        if target < self.store.len() {
            self.selected = target;
        }
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.store.len().saturating_sub(1));
    }
}
