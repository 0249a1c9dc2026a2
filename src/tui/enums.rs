//! Enumerations for TUI state management.

/// Screen the terminal user interface is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    TaskList,
    AddTask,
    Filters,
    EditTask,
    PermissionPrompt,
    Help,
}
