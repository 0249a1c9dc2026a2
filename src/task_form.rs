//! Task form state shared by the add bar and the inline editor.
//!
//! This module provides the `TaskForm` structure, field ordering and the
//! conversion of form contents into a `TaskDraft`.

use crate::fields::{Priority, PRIORITY_OPTIONS};
use crate::input::InputField;
use crate::task::{Task, TaskDraft};

/// Global order constants for form fields.
pub const TITLE_GLOBAL_ORDER: usize = 0;
pub const DATE_GLOBAL_ORDER: usize = 1;
pub const TIME_GLOBAL_ORDER: usize = 2;
pub const PRIORITY_GLOBAL_ORDER: usize = 3;

/// Form with title, date and time inputs plus a priority selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskForm {
    pub title: InputField,
    pub date: InputField,
    pub time: InputField,
    pub priority: usize,
    pub priorities: Vec<Option<Priority>>,
    pub current_field: usize,
}

impl TaskForm {
    /// Blank form for adding a task. The priority starts unselected, so it
    /// must be picked before the task is accepted.
    pub fn new() -> Self {
        let mut priorities = vec![None];
        priorities.extend(PRIORITY_OPTIONS.iter().copied().map(Some));
        let mut form = Self {
            title: InputField::new(),
            date: InputField::new(),
            time: InputField::new(),
            priority: 0,
            priorities,
            current_field: TITLE_GLOBAL_ORDER,
        };
        form.update_active_field();
        form
    }

    /// Form populated from an existing task; only real priorities are offered.
    pub fn from_task(task: &Task) -> Self {
        let priorities: Vec<Option<Priority>> = PRIORITY_OPTIONS.iter().copied().map(Some).collect();
        let mut form = Self {
            title: InputField::with_value(&task.title),
            date: InputField::with_value(task.date.as_deref().unwrap_or("")),
            time: InputField::with_value(task.time.as_deref().unwrap_or("")),
            priority: priorities.iter().position(|p| *p == Some(task.priority)).unwrap_or(0),
            priorities,
            current_field: TITLE_GLOBAL_ORDER,
        };
        form.update_active_field();
        form
    }

    /// Get the total number of fields (inputs + selector).
    pub fn field_count(&self) -> usize {
        4
    }

    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % self.field_count();
        self.update_active_field();
    }

    pub fn prev_field(&mut self) {
        self.current_field = if self.current_field == 0 {
            self.field_count() - 1
        } else {
            self.current_field - 1
        };
        self.update_active_field();
    }

    /// Update which field is currently active for editing.
    pub fn update_active_field(&mut self) {
        self.title.active = self.current_field == TITLE_GLOBAL_ORDER;
        self.date.active = self.current_field == DATE_GLOBAL_ORDER;
        self.time.active = self.current_field == TIME_GLOBAL_ORDER;
    }

    fn current_input(&mut self) -> Option<&mut InputField> {
        match self.current_field {
            TITLE_GLOBAL_ORDER => Some(&mut self.title),
            DATE_GLOBAL_ORDER => Some(&mut self.date),
            TIME_GLOBAL_ORDER => Some(&mut self.time),
            _ => None,
        }
    }

    pub fn handle_char(&mut self, c: char) {
        if let Some(field) = self.current_input() {
            field.handle_char(c);
        }
    }

    pub fn handle_backspace(&mut self) {
        if let Some(field) = self.current_input() {
            field.handle_backspace();
        }
    }

    pub fn handle_delete(&mut self) {
        if let Some(field) = self.current_input() {
            field.handle_delete();
        }
    }

    /// Move the cursor, or cycle the priority selector when it is focused.
    pub fn handle_left_right(&mut self, right: bool) {
        if self.current_field == PRIORITY_GLOBAL_ORDER {
            let n = self.priorities.len();
            self.priority = if right {
                (self.priority + 1) % n
            } else if self.priority == 0 {
                n - 1
            } else {
                self.priority - 1
            };
            return;
        }
        if let Some(field) = self.current_input() {
            if right {
                field.move_cursor_right();
            } else {
                field.move_cursor_left();
            }
        }
    }

    pub fn selected_priority(&self) -> Option<Priority> {
        self.priorities.get(self.priority).copied().flatten()
    }

    /// Form contents as a draft; blank date/time become absent later.
    pub fn to_draft(&self) -> TaskDraft {
        TaskDraft {
            title: self.title.value.clone(),
            date: Some(self.date.value.clone()),
            time: Some(self.time.value.clone()),
            priority: self.selected_priority(),
        }
    }

    /// Reset all inputs and the selector, keeping the focus on the title.
    pub fn clear(&mut self) {
        self.title.clear();
        self.date.clear();
        self.time.clear();
        self.priority = 0;
        self.current_field = TITLE_GLOBAL_ORDER;
        self.update_active_field();
    }
}

impl Default for TaskForm {
    fn default() -> Self {
        Self::new()
    }
}
