//! Projection of a task sequence into displayable rows.
//!
//! `render` is pure: the same input always yields the same view, and the view
//! carries no state of its own. Front ends rebuild it after every change.

use crate::fields::{format_priority, format_status, Priority, Status};
use crate::task::{Task, TaskId};

/// Placeholder shown when there is nothing to list.
pub const NO_TASKS_MESSAGE: &str = "No tasks found";

/// Actions offered on every row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Toggle,
    Edit,
    Delete,
}

pub const ROW_ACTIONS: [RowAction; 3] = [RowAction::Toggle, RowAction::Edit, RowAction::Delete];

/// One displayed task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    pub id: TaskId,
    pub title: String,
    pub completed: bool,
    /// Date, time and status, e.g. `2025-04-01 09:00 • Pending`.
    pub subtitle: String,
    pub priority: Priority,
}

impl TaskRow {
    pub fn action_label(&self, action: RowAction) -> &'static str {
        match action {
            RowAction::Toggle if self.completed => "Undo",
            RowAction::Toggle => "Done",
            RowAction::Edit => "Edit",
            RowAction::Delete => "Delete",
        }
    }
}

/// The whole list as it should be shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskListView {
    Empty,
    Rows(Vec<TaskRow>),
}

impl TaskListView {
    pub fn rows(&self) -> &[TaskRow] {
        match self {
            TaskListView::Empty => &[],
            TaskListView::Rows(rows) => rows,
        }
    }
}

/// Build the view for `tasks`, in the order given.
pub fn render<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> TaskListView {
    let rows: Vec<TaskRow> = tasks.into_iter().map(render_row).collect();
    if rows.is_empty() {
        TaskListView::Empty
    } else {
        TaskListView::Rows(rows)
    }
}

fn render_row(task: &Task) -> TaskRow {
    TaskRow {
        id: task.id.clone(),
        title: task.title.clone(),
        completed: task.status == Status::Completed,
        subtitle: subtitle(task),
        priority: task.priority,
    }
}

/// `"{date} {time} • {status}"`, with absent parts left blank.
pub fn subtitle(task: &Task) -> String {
    format!(
        "{} {} • {}",
        task.date.as_deref().unwrap_or(""),
        task.time.as_deref().unwrap_or(""),
        format_status(task.status)
    )
}

/// One line of the plain-text list.
pub fn format_row(row: &TaskRow) -> String {
    let marker = if row.completed { "[x]" } else { "[ ]" };
    let actions: Vec<&str> = ROW_ACTIONS.iter().map(|a| row.action_label(*a)).collect();
    format!(
        "{} {:<32} {:<28} {:<6} {:<8} ({})",
        marker,
        truncate(&row.title, 32),
        row.subtitle,
        format_priority(row.priority),
        short_id(&row.id),
        actions.join("/")
    )
}

/// Plain-text rendering of the whole view.
pub fn format_view(view: &TaskListView) -> Vec<String> {
    match view {
        TaskListView::Empty => vec![NO_TASKS_MESSAGE.to_string()],
        TaskListView::Rows(rows) => rows.iter().map(format_row).collect(),
    }
}

/// Print the view to stdout.
pub fn print_view(view: &TaskListView) {
    for line in format_view(view) {
        println!("{line}");
    }
}

/// First eight characters of an id, enough to address it from the CLI.
pub fn short_id(id: &TaskId) -> String {
    id.as_str().chars().take(8).collect()
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}
