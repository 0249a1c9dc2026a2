//! Filter bar state for the terminal user interface.

use crate::fields::{DayBucket, Priority, StatusFilter, PRIORITY_OPTIONS};
use crate::filter::FilterCriteria;
use crate::input::InputField;

pub const SEARCH_FIELD: usize = 0;
pub const STATUS_FIELD: usize = 1;
pub const DATE_FIELD: usize = 2;
pub const DAY_FIELD: usize = 3;
pub const PRIORITY_FIELD: usize = 4;

const STATUSES: [StatusFilter; 3] = [StatusFilter::All, StatusFilter::Pending, StatusFilter::Completed];
const DAYS: [DayBucket; 4] = [DayBucket::All, DayBucket::Today, DayBucket::Tomorrow, DayBucket::Week];

/// The five filter controls: search text, status, exact date, day bucket
/// and priority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterForm {
    pub search: InputField,
    pub date: InputField,
    pub status: usize,
    pub day: usize,
    pub priority: usize,
    pub priorities: Vec<Option<Priority>>,
    pub current_field: usize,
}

impl FilterForm {
    pub fn new() -> Self {
        let mut priorities = vec![None];
        priorities.extend(PRIORITY_OPTIONS.iter().copied().map(Some));
        Self {
            search: InputField::new(),
            date: InputField::new(),
            status: 0,
            day: 0,
            priority: 0,
            priorities,
            current_field: SEARCH_FIELD,
        }
    }

    pub fn field_count(&self) -> usize {
        5
    }

    pub fn focus(&mut self, field: usize) {
        self.current_field = field % self.field_count();
        self.update_active_field();
    }

    pub fn next_field(&mut self) {
        self.focus(self.current_field + 1);
    }

    pub fn prev_field(&mut self) {
        self.focus(self.current_field + self.field_count() - 1);
    }

    pub fn update_active_field(&mut self) {
        self.search.active = self.current_field == SEARCH_FIELD;
        self.date.active = self.current_field == DATE_FIELD;
    }

    /// Mark every field inactive (bar not focused).
    pub fn blur(&mut self) {
        self.search.active = false;
        self.date.active = false;
    }

    fn current_input(&mut self) -> Option<&mut InputField> {
        match self.current_field {
            SEARCH_FIELD => Some(&mut self.search),
            DATE_FIELD => Some(&mut self.date),
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

    /// Move the cursor, or cycle the focused selector.
    pub fn handle_left_right(&mut self, right: bool) {
        fn cycle(i: usize, n: usize, right: bool) -> usize {
            if right {
                (i + 1) % n
            } else if i == 0 {
                n - 1
            } else {
                i - 1
            }
        }
        match self.current_field {
            STATUS_FIELD => self.status = cycle(self.status, STATUSES.len(), right),
            DAY_FIELD => self.day = cycle(self.day, DAYS.len(), right),
            PRIORITY_FIELD => self.priority = cycle(self.priority, self.priorities.len(), right),
            _ => {
                if let Some(field) = self.current_input() {
                    if right {
                        field.move_cursor_right();
                    } else {
                        field.move_cursor_left();
                    }
                }
            }
        }
    }

    pub fn status_filter(&self) -> StatusFilter {
        STATUSES[self.status % STATUSES.len()]
    }

    pub fn day_bucket(&self) -> DayBucket {
        DAYS[self.day % DAYS.len()]
    }

    pub fn selected_priority(&self) -> Option<Priority> {
        self.priorities.get(self.priority).copied().flatten()
    }

    /// Criteria described by the current control values.
    pub fn criteria(&self) -> FilterCriteria {
        let date = self.date.value.trim();
        FilterCriteria {
            text: self.search.value.clone(),
            status: self.status_filter(),
            date: (!date.is_empty()).then(|| date.to_string()),
            day: self.day_bucket(),
            priority: self.selected_priority(),
        }
    }

    /// Reset every control to "all".
    pub fn clear(&mut self) {
        let focused = self.current_field;
        *self = FilterForm::new();
        self.current_field = focused;
    }
}

impl Default for FilterForm {
    fn default() -> Self {
        Self::new()
    }
}
