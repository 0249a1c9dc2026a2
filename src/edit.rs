//! Inline edit controller.
//!
//! A row is either displayed or being edited. Only one row can be in the
//! editing state: opening an editor on another row replaces the open one.

use tracing::debug;

use crate::error::ValidationError;
use crate::storage::KeyValueStore;
use crate::store::TaskStore;
use crate::task::{Task, TaskId};
use crate::task_form::TaskForm;

/// Edit state of the task list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditState {
    #[default]
    Display,
    Editing { task_id: TaskId, form: TaskForm },
}

#[derive(Debug, Default)]
pub struct EditController {
    state: EditState,
}

impl EditController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    /// Open the editor on `task`, pre-filled with its current values.
    pub fn begin(&mut self, task: &Task) {
        debug!(id = %task.id, "editing task");
        self.state = EditState::Editing {
            task_id: task.id.clone(),
            form: TaskForm::from_task(task),
        };
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, EditState::Editing { .. })
    }

    /// Id of the row being edited.
    pub fn editing_id(&self) -> Option<&TaskId> {
        match &self.state {
            EditState::Editing { task_id, .. } => Some(task_id),
            EditState::Display => None,
        }
    }

    pub fn form(&self) -> Option<&TaskForm> {
        match &self.state {
            EditState::Editing { form, .. } => Some(form),
            EditState::Display => None,
        }
    }

    pub fn form_mut(&mut self) -> Option<&mut TaskForm> {
        match &mut self.state {
            EditState::Editing { form, .. } => Some(form),
            EditState::Display => None,
        }
    }

    /// Commit the form into `store`.
    ///
    /// On success returns the edited id and goes back to display. A
    /// validation error leaves the editor open. Saving while not editing, or
    /// for a task that has since disappeared, returns `Ok(None)`.
    pub fn save<S: KeyValueStore>(&mut self, store: &mut TaskStore<S>) -> Result<Option<TaskId>, ValidationError> {
        let EditState::Editing { task_id, form } = &self.state else {
            return Ok(None);
        };
        let edited = store.edit(task_id, form.to_draft())?;
        let id = task_id.clone();
        self.state = EditState::Display;
        Ok(edited.then_some(id))
    }

    /// Discard the form without touching the store.
    pub fn cancel(&mut self) {
        if let Some(id) = self.editing_id() {
            debug!(id = %id, "edit cancelled");
        }
        self.state = EditState::Display;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Priority;
    use crate::storage::MemoryStore;
    use crate::task::TaskDraft;

    fn store_with_task() -> (TaskStore<MemoryStore>, Task) {
        let mut store = TaskStore::open(MemoryStore::new(), "tasks");
        let task = store
            .add(TaskDraft::new("Pay rent", Some(Priority::High)).with_date("2025-04-01").with_time("09:00"))
            .unwrap();
        (store, task)
    }

    #[test]
    fn starts_in_display() {
        let editor = EditController::new();
        assert_eq!(editor.state(), &EditState::Display);
        assert!(editor.form().is_none());
    }

    #[test]
    fn save_commits_and_returns_to_display() {
        let (mut store, task) = store_with_task();
        let mut editor = EditController::new();
        editor.begin(&task);
        let form = editor.form_mut().unwrap();
        form.title.clear();
        "Pay rent early".chars().for_each(|c| form.title.handle_char(c));
        form.current_field = crate::task_form::PRIORITY_GLOBAL_ORDER;
        form.handle_left_right(false);

        assert_eq!(editor.save(&mut store), Ok(Some(task.id.clone())));
        assert!(!editor.is_editing());
        let saved = store.get(&task.id).unwrap();
        assert_eq!(saved.title, "Pay rent early");
        assert_eq!(saved.priority, Priority::Medium);
        assert_eq!(saved.time.as_deref(), Some("09:00"));
    }

    #[test]
    fn cancel_leaves_store_untouched() {
        let (store, task) = store_with_task();
        let mut editor = EditController::new();
        editor.begin(&task);
        editor.form_mut().unwrap().title.clear();
        editor.cancel();
        assert!(!editor.is_editing());
        assert_eq!(store.get(&task.id), Some(&task));
    }

    #[test]
    fn blank_title_keeps_editor_open() {
        let (mut store, task) = store_with_task();
        let mut editor = EditController::new();
        editor.begin(&task);
        editor.form_mut().unwrap().title.clear();
        assert_eq!(editor.save(&mut store), Err(ValidationError::MissingTitleOrPriority));
        assert_eq!(editor.editing_id(), Some(&task.id));
        assert_eq!(store.get(&task.id).unwrap().title, "Pay rent");
    }

    #[test]
    fn opening_another_row_replaces_editor() {
        let (mut store, first) = store_with_task();
        let second = store.add(TaskDraft::new("Buy milk", Some(Priority::Low))).unwrap();
        let mut editor = EditController::new();
        editor.begin(&first);
        editor.begin(&second);
        assert_eq!(editor.editing_id(), Some(&second.id));
        assert_eq!(editor.form().unwrap().title.value, "Buy milk");
    }
}
