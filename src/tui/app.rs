//! Main application logic for the terminal user interface.
//!
//! This module contains the `App` struct which owns the task store for the
//! session, wires the add bar, filter bar, inline editor and reminder
//! schedule together, and draws the list from the `render` projection after
//! every change.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use tracing::{debug, info};

use crate::edit::EditController;
use crate::fields::{format_day_bucket, format_priority, format_status_filter, Status};
use crate::filter::{filter_tasks_now, FilterCriteria};
use crate::input::InputField;
use crate::reminder::{deliver, Notifier, Permission, ReminderScheduler};
use crate::render::{render, TaskListView, TaskRow, NO_TASKS_MESSAGE, ROW_ACTIONS};
use crate::storage::{load_permission, save_permission, KeyValueStore};
use crate::store::TaskStore;
use crate::task::{Task, TaskId};
use crate::task_form::{TaskForm, DATE_GLOBAL_ORDER, PRIORITY_GLOBAL_ORDER, TIME_GLOBAL_ORDER, TITLE_GLOBAL_ORDER};
use crate::tui::{
    colors::{priority_color, DARK_PURPLE, DARK_RED},
    enums::AppState,
    filter_form::{FilterForm, DATE_FIELD, DAY_FIELD, PRIORITY_FIELD, SEARCH_FIELD, STATUS_FIELD},
    utils::centered_rect,
};

/// Main application state for the terminal user interface.
pub struct App<S: KeyValueStore> {
    state: AppState,
    store: TaskStore<S>,
    scheduler: ReminderScheduler,
    permission: Permission,
    /// Criteria currently applied to the list, if any.
    applied_filter: Option<FilterCriteria>,
    list_state: TableState,
    add_form: TaskForm,
    filter_form: FilterForm,
    editor: EditController,
    alerts: VecDeque<String>,
    status_message: String,
}

impl<S: KeyValueStore> App<S> {
    /// Create the app over an opened store and seed reminders for every
    /// loaded task.
    pub fn new(store: TaskStore<S>, scheduler: ReminderScheduler) -> Self {
        let permission = load_permission(store.storage());
        let mut app = App {
            state: if permission.needs_request() {
                AppState::PermissionPrompt
            } else {
                AppState::TaskList
            },
            store,
            scheduler,
            permission,
            applied_filter: None,
            list_state: TableState::default(),
            add_form: TaskForm::new(),
            filter_form: FilterForm::new(),
            editor: EditController::new(),
            alerts: VecDeque::new(),
            status_message: String::new(),
        };
        app.add_form.title.active = false;
        app.scheduler.schedule_all(app.store.tasks(), Local::now());
        app.clamp_selection();
        app
    }

    /// Tasks currently listed: the filtered view if one is applied, the whole
    /// store otherwise.
    fn visible_tasks(&self) -> Vec<&Task> {
        match &self.applied_filter {
            Some(criteria) => filter_tasks_now(self.store.tasks(), criteria),
            None => self.store.tasks().iter().collect(),
        }
    }

    fn selected_id(&self) -> Option<TaskId> {
        let idx = self.list_state.selected()?;
        self.visible_tasks().get(idx).map(|t| t.id.clone())
    }

    fn select_id(&mut self, id: &TaskId) {
        let idx = self.visible_tasks().iter().position(|t| &t.id == id);
        if idx.is_some() {
            self.list_state.select(idx);
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_tasks().len();
        let selected = match (len, self.list_state.selected()) {
            (0, _) => None,
            (_, None) => Some(0),
            (n, Some(i)) => Some(i.min(n - 1)),
        };
        self.list_state.select(selected);
    }

    fn move_selection(&mut self, down: bool) {
        let len = self.visible_tasks().len();
        if len == 0 {
            return;
        }
        let current = self.list_state.selected().unwrap_or(0);
        let next = if down {
            (current + 1).min(len - 1)
        } else {
            current.saturating_sub(1)
        };
        self.list_state.select(Some(next));
    }

    /// Show the whole store again. Every mutation ends here.
    fn show_all(&mut self) {
        self.applied_filter = None;
        self.clamp_selection();
    }

    fn apply_filters(&mut self) {
        let criteria = self.filter_form.criteria();
        debug!(?criteria, "filters changed");
        self.applied_filter = Some(criteria);
        self.list_state.select(None);
        self.clamp_selection();
    }

    fn clear_filters(&mut self) {
        self.filter_form.clear();
        if self.state == AppState::Filters {
            self.filter_form.update_active_field();
        }
        self.show_all();
        self.set_status_message("Filters cleared".to_string());
    }

    fn set_status_message(&mut self, msg: String) {
        self.status_message = msg;
    }

    fn clear_status_message(&mut self) {
        self.status_message.clear();
    }

    fn submit_add(&mut self) {
        match self.store.add(self.add_form.to_draft()) {
            Ok(task) => {
                info!(id = %task.id, "task added from UI");
                self.scheduler.schedule(&task, Local::now());
                self.add_form.clear();
                self.add_form.title.active = false;
                self.state = AppState::TaskList;
                self.show_all();
                self.select_id(&task.id);
                self.set_status_message(format!("Added '{}'", task.title));
            }
            Err(e) => self.alerts.push_back(e.to_string()),
        }
    }

    fn toggle_selected(&mut self) {
        if let Some(id) = self.selected_id() {
            self.store.toggle_status(&id);
            self.show_all();
            self.select_id(&id);
        }
    }

    fn delete_selected(&mut self) {
        if let Some(id) = self.selected_id() {
            self.store.remove(&id);
            self.scheduler.cancel(&id);
            self.show_all();
        }
    }

    fn begin_edit(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        if let Some(task) = self.store.get(&id) {
            self.editor.begin(task);
            self.state = AppState::EditTask;
        }
    }

    fn save_edit(&mut self) {
        match self.editor.save(&mut self.store) {
            Ok(edited) => {
                if let Some(task) = edited.as_ref().and_then(|id| self.store.get(id)) {
                    self.scheduler.schedule(task, Local::now());
                }
                self.state = AppState::TaskList;
                self.show_all();
                if let Some(id) = edited {
                    self.select_id(&id);
                }
            }
            Err(e) => self.alerts.push_back(e.to_string()),
        }
    }

    fn cancel_edit(&mut self) {
        let id = self.editor.editing_id().cloned();
        self.editor.cancel();
        self.state = AppState::TaskList;
        self.show_all();
        if let Some(id) = id {
            self.select_id(&id);
        }
    }

    fn set_permission(&mut self, permission: Permission) {
        self.permission = permission;
        save_permission(self.store.storage_mut(), permission);
        info!(?permission, "notification permission decided");
    }

    /// Deliver every reminder that has come due.
    pub fn fire_due_reminders(&mut self) {
        let permission = self.permission;
        for reminder in self.scheduler.take_due(Local::now()) {
            deliver(&reminder, permission, &mut *self);
        }
    }

    fn handle_task_list_input(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(true),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(false),
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('d') => self.toggle_selected(),
            KeyCode::Char('e') => self.begin_edit(),
            KeyCode::Char('x') | KeyCode::Delete => self.delete_selected(),
            KeyCode::Char('a') => {
                self.add_form.update_active_field();
                self.state = AppState::AddTask;
            }
            KeyCode::Char('f') => {
                self.filter_form.update_active_field();
                self.state = AppState::Filters;
            }
            KeyCode::Char('/') => {
                self.filter_form.focus(SEARCH_FIELD);
                self.state = AppState::Filters;
            }
            KeyCode::Char('c') => self.clear_filters(),
            KeyCode::Char('h') | KeyCode::Char('?') => self.state = AppState::Help,
            _ => {}
        }
        false
    }

    fn handle_add_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.add_form.title.active = false;
                self.add_form.date.active = false;
                self.add_form.time.active = false;
                self.state = AppState::TaskList;
            }
            KeyCode::Enter => self.submit_add(),
            KeyCode::Tab | KeyCode::Down => self.add_form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.add_form.prev_field(),
            KeyCode::Left => self.add_form.handle_left_right(false),
            KeyCode::Right => self.add_form.handle_left_right(true),
            KeyCode::Backspace => self.add_form.handle_backspace(),
            KeyCode::Delete => self.add_form.handle_delete(),
            KeyCode::Char(c) => self.add_form.handle_char(c),
            _ => {}
        }
    }

    fn handle_filter_input(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        match key {
            KeyCode::Esc | KeyCode::Enter => {
                self.filter_form.blur();
                self.state = AppState::TaskList;
            }
            KeyCode::Char('l') if modifiers.contains(KeyModifiers::CONTROL) => self.clear_filters(),
            KeyCode::Tab | KeyCode::Down => self.filter_form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.filter_form.prev_field(),
            KeyCode::Left => {
                self.filter_form.handle_left_right(false);
                self.apply_filters();
            }
            KeyCode::Right => {
                self.filter_form.handle_left_right(true);
                self.apply_filters();
            }
            KeyCode::Backspace => {
                self.filter_form.handle_backspace();
                self.apply_filters();
            }
            KeyCode::Char(c) => {
                self.filter_form.handle_char(c);
                self.apply_filters();
            }
            _ => {}
        }
    }

    fn handle_edit_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => self.cancel_edit(),
            KeyCode::Enter => self.save_edit(),
            _ => {
                let Some(form) = self.editor.form_mut() else {
                    self.state = AppState::TaskList;
                    return;
                };
                match key {
                    KeyCode::Tab | KeyCode::Down => form.next_field(),
                    KeyCode::BackTab | KeyCode::Up => form.prev_field(),
                    KeyCode::Left => form.handle_left_right(false),
                    KeyCode::Right => form.handle_left_right(true),
                    KeyCode::Backspace => form.handle_backspace(),
                    KeyCode::Delete => form.handle_delete(),
                    KeyCode::Char(c) => form.handle_char(c),
                    _ => {}
                }
            }
        }
    }

    fn handle_permission_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') => self.set_permission(Permission::Granted),
            KeyCode::Char('n') | KeyCode::Char('N') => self.set_permission(Permission::Denied),
            KeyCode::Esc | KeyCode::Char('l') => {}
            _ => return,
        }
        self.state = AppState::TaskList;
    }

    /// Handle one key press. Returns true if the application should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        if !self.alerts.is_empty() {
            // Alerts are modal: nothing else reacts until dismissed.
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.alerts.pop_front();
            }
            return false;
        }
        self.clear_status_message();

        match self.state {
            AppState::TaskList => return self.handle_task_list_input(key.code),
            AppState::AddTask => self.handle_add_input(key.code),
            AppState::Filters => self.handle_filter_input(key.code, key.modifiers),
            AppState::EditTask => self.handle_edit_input(key.code),
            AppState::PermissionPrompt => self.handle_permission_input(key.code),
            AppState::Help => self.state = AppState::TaskList,
        }
        false
    }

    /// Poll for and handle keyboard events.
    ///
    /// Returns true if the application should quit.
    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                return Ok(self.handle_key(key));
            }
        }
        Ok(false)
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let pending = self.store.tasks().iter().filter(|t| t.status == Status::Pending).count();
        let header = Paragraph::new(Line::from(vec![
            Span::styled("TASK LIST", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                format!(
                    "{} tasks, {} pending | reminders armed: {} | {}",
                    self.store.len(),
                    pending,
                    self.scheduler.len(),
                    self.permission.as_label()
                ),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ),
        ]))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
        f.render_widget(header, area);
    }

    fn render_add_bar(&self, f: &mut Frame, area: Rect) {
        let focused = self.state == AppState::AddTask;
        let form = &self.add_form;
        let priority = form
            .selected_priority()
            .map_or("choose priority", format_priority);
        let spans = vec![
            field_span("Title", &form.title, focused && form.current_field == TITLE_GLOBAL_ORDER),
            field_span("Date", &form.date, focused && form.current_field == DATE_GLOBAL_ORDER),
            field_span("Time", &form.time, focused && form.current_field == TIME_GLOBAL_ORDER),
            selector_span("Priority", priority, focused && form.current_field == PRIORITY_GLOBAL_ORDER),
        ];
        let title = if focused {
            "Add Task (Enter add, Tab next field, Esc back)"
        } else {
            "Add Task (a)"
        };
        let bar = Paragraph::new(Line::from(spans.into_iter().flatten().collect::<Vec<_>>()))
            .block(Block::default().borders(Borders::ALL).title(title).border_style(focus_style(focused)));
        f.render_widget(bar, area);
    }

    fn render_filter_bar(&self, f: &mut Frame, area: Rect) {
        let focused = self.state == AppState::Filters;
        let form = &self.filter_form;
        let priority = form.selected_priority().map_or("all", format_priority);
        let spans = vec![
            field_span("Search", &form.search, focused && form.current_field == SEARCH_FIELD),
            selector_span(
                "Status",
                format_status_filter(form.status_filter()),
                focused && form.current_field == STATUS_FIELD,
            ),
            field_span("Date", &form.date, focused && form.current_field == DATE_FIELD),
            selector_span("Day", format_day_bucket(form.day_bucket()), focused && form.current_field == DAY_FIELD),
            selector_span("Priority", priority, focused && form.current_field == PRIORITY_FIELD),
        ];
        let title = if focused {
            "Filters (Tab next, ←/→ change, Ctrl+L clear, Esc back)"
        } else if self.applied_filter.is_none() && !form.criteria().is_default() {
            "Filters (not applied; f to apply, c to clear)"
        } else {
            "Filters (f, / search, c clear)"
        };
        let bar = Paragraph::new(Line::from(spans.into_iter().flatten().collect::<Vec<_>>()))
            .block(Block::default().borders(Borders::ALL).title(title).border_style(focus_style(focused)));
        f.render_widget(bar, area);
    }

    fn render_task_list(&mut self, f: &mut Frame, area: Rect) {
        let view = render(self.visible_tasks());
        let block = Block::default().borders(Borders::ALL).title(format!(
            "Tasks ({}/{}) - Press 'h' for help",
            view.rows().len(),
            self.store.len()
        ));

        let rows = match &view {
            TaskListView::Empty => {
                let placeholder = Paragraph::new(NO_TASKS_MESSAGE)
                    .style(Style::default().fg(Color::DarkGray))
                    .alignment(Alignment::Center)
                    .block(block);
                f.render_widget(placeholder, area);
                return;
            }
            TaskListView::Rows(rows) => rows,
        };

        let header = Row::new(["", "Title", "When • Status", "Priority", "Actions"]
            .into_iter()
            .map(|h| Cell::from(h).style(Style::default().add_modifier(Modifier::BOLD))))
        .style(Style::default().bg(Color::Blue).fg(Color::White))
        .height(1);

        let table_rows: Vec<Row> = rows
            .iter()
            .map(|row| match self.editor.form() {
                Some(form) if self.editor.editing_id() == Some(&row.id) => editing_row(form),
                _ => display_row(row),
            })
            .collect();

        let widths = [
            Constraint::Length(3),
            Constraint::Min(24),
            Constraint::Length(30),
            Constraint::Length(10),
            Constraint::Length(24),
        ];

        let table = Table::new(table_rows, widths)
            .header(header)
            .block(block)
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, area, &mut self.list_state);
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let lines = [
            ("↑/↓ j/k", "select task"),
            ("Enter, Space, d", "Done / Undo"),
            ("e", "edit selected task inline (Enter save, Esc cancel)"),
            ("x, Del", "delete selected task"),
            ("a", "focus the add bar"),
            ("f, /", "focus the filter bar / search"),
            ("c", "clear filters"),
            ("q, Esc", "quit"),
        ];
        let text: Vec<Line> = lines
            .iter()
            .map(|(k, d)| {
                Line::from(vec![
                    Span::styled(format!("{k:<18}"), Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw(*d),
                ])
            })
            .collect();
        let help = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title("Help (any key to close)"))
            .wrap(Wrap { trim: true });
        f.render_widget(help, area);
    }

    fn render_dialog(f: &mut Frame, area: Rect, title: &str, body: &str, footer: &str, bg: Color) {
        let area = centered_rect(50, 25, area);
        f.render_widget(Clear, area);
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(body.to_string(), Style::default().add_modifier(Modifier::BOLD))),
            Line::from(""),
            Line::from(footer.to_string()),
        ];
        let dialog = Paragraph::new(text)
            .block(Block::default().title(title.to_string()).borders(Borders::ALL).style(Style::default().bg(bg)))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(dialog, area);
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let status_text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            match self.state {
                AppState::TaskList => "a add | f filter | e edit | d done | x delete | h help | q quit".to_string(),
                AppState::AddTask => "Add New Task".to_string(),
                AppState::Filters => "Filter Tasks".to_string(),
                AppState::EditTask => "Edit Task (Enter save, Esc cancel, ←/→ priority)".to_string(),
                AppState::PermissionPrompt => "Notification Permission".to_string(),
                AppState::Help => "Help".to_string(),
            }
        };
        let status = Paragraph::new(status_text)
            .style(Style::default().bg(Color::Blue).fg(Color::White))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    /// Draw the whole screen.
    pub fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);
        self.render_add_bar(f, chunks[1]);
        self.render_filter_bar(f, chunks[2]);
        if self.state == AppState::Help {
            self.render_help(f, chunks[3]);
        } else {
            self.render_task_list(f, chunks[3]);
        }
        self.render_status_bar(f, chunks[4]);

        let screen = f.area();
        if self.state == AppState::PermissionPrompt {
            Self::render_dialog(
                f,
                screen,
                "Notifications",
                "Allow reminder notifications?",
                "y allow | n block | Esc decide later",
                DARK_PURPLE,
            );
        }
        if let Some(message) = self.alerts.front() {
            Self::render_dialog(f, screen, "Alert", message, "Press Enter to dismiss", DARK_RED);
        }
    }

    /// Main event loop for the TUI application.
    ///
    /// Draws, handles input, then fires any reminders that came due, until
    /// the user exits.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
            self.fire_due_reminders();
        }
        Ok(())
    }
}

impl<S: KeyValueStore> Notifier for App<S> {
    fn notify(&mut self, title: &str, body: &str) {
        self.set_status_message(format!("🔔 {title}: {body}"));
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push_back(message.to_string());
    }
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    }
}

fn field_style(focused: bool) -> Style {
    if focused {
        Style::default().bg(Color::Gray).fg(Color::Black)
    } else {
        Style::default().fg(Color::White)
    }
}

fn field_span(label: &str, field: &InputField, focused: bool) -> Vec<Span<'static>> {
    let value = if focused { field.display() } else { field.value.clone() };
    vec![
        Span::styled(format!("{label}: "), Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(format!("[{value}]"), field_style(focused)),
        Span::raw("  "),
    ]
}

fn selector_span(label: &str, value: &str, focused: bool) -> Vec<Span<'static>> {
    vec![
        Span::styled(format!("{label}: "), Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(format!("< {value} >"), field_style(focused)),
        Span::raw("  "),
    ]
}

fn display_row(row: &TaskRow) -> Row<'static> {
    let title_style = if row.completed {
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default().fg(Color::White)
    };
    let actions: Vec<String> = ROW_ACTIONS
        .iter()
        .map(|a| format!("[{}]", row.action_label(*a)))
        .collect();
    Row::new(vec![
        Cell::from(if row.completed { "✓" } else { " " }),
        Cell::from(row.title.clone()).style(title_style),
        Cell::from(row.subtitle.clone()),
        Cell::from(format_priority(row.priority))
            .style(Style::default().bg(priority_color(row.priority)).fg(Color::White)),
        Cell::from(actions.join(" ")),
    ])
}

fn editing_row(form: &TaskForm) -> Row<'static> {
    let cell = |field: &InputField, order: usize| {
        Cell::from(format!("[{}]", field.display())).style(field_style(form.current_field == order))
    };
    let priority = form.selected_priority().map_or("-", format_priority);
    let schedule = Line::from(vec![
        Span::styled(format!("[{}]", form.date.display()), field_style(form.current_field == DATE_GLOBAL_ORDER)),
        Span::raw(" "),
        Span::styled(format!("[{}]", form.time.display()), field_style(form.current_field == TIME_GLOBAL_ORDER)),
    ]);
    Row::new(vec![
        Cell::from("✎"),
        cell(&form.title, TITLE_GLOBAL_ORDER),
        Cell::from(schedule),
        Cell::from(format!("< {priority} >")).style(field_style(form.current_field == PRIORITY_GLOBAL_ORDER)),
        Cell::from("[Save] [Cancel]"),
    ])
    .style(Style::default().add_modifier(Modifier::BOLD))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Priority, Status};
    use crate::storage::MemoryStore;
    use crate::task::TaskDraft;
    use ratatui::backend::TestBackend;

    fn app_with(titles: &[&str]) -> App<MemoryStore> {
        let mut storage = MemoryStore::new();
        save_permission(&mut storage, Permission::Denied);
        let mut store = TaskStore::open(storage, "tasks");
        for title in titles {
            store.add(TaskDraft::new(*title, Some(Priority::Medium))).unwrap();
        }
        App::new(store, ReminderScheduler::default())
    }

    fn press(app: &mut App<MemoryStore>, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut App<MemoryStore>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn screen(app: &mut App<MemoryStore>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn asks_for_permission_once() {
        let store = TaskStore::open(MemoryStore::new(), "tasks");
        let mut app = App::new(store, ReminderScheduler::default());
        assert_eq!(app.state, AppState::PermissionPrompt);
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.state, AppState::TaskList);
        assert_eq!(load_permission(app.store.storage()), Permission::Granted);
    }

    #[test]
    fn empty_store_shows_placeholder() {
        let mut app = app_with(&[]);
        assert!(screen(&mut app).contains(NO_TASKS_MESSAGE));
    }

    #[test]
    fn add_requires_priority_and_alerts() {
        let mut app = app_with(&[]);
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "Pay rent");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.store.len(), 0);
        assert_eq!(app.alerts.front().map(String::as_str), Some("Enter task title and priority!"));

        // Modal: the next key only dismisses it.
        press(&mut app, KeyCode::Enter);
        assert!(app.alerts.is_empty());
        assert_eq!(app.state, AppState::AddTask);

        press(&mut app, KeyCode::BackTab);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.store.len(), 1);
        assert_eq!(app.store.tasks()[0].priority, Priority::High);
        assert_eq!(app.state, AppState::TaskList);
        assert!(screen(&mut app).contains("Pay rent"));
    }

    #[test]
    fn toggle_then_filter_by_status() {
        let mut app = app_with(&["Pay rent"]);
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.store.tasks()[0].status, Status::Completed);
        assert!(screen(&mut app).contains("[Undo]"));

        press(&mut app, KeyCode::Char('f'));
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.visible_tasks().len(), 0);
        assert!(screen(&mut app).contains(NO_TASKS_MESSAGE));
        press(&mut app, KeyCode::Right);
        assert_eq!(app.visible_tasks().len(), 1);

        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('c'));
        assert!(app.applied_filter.is_none());
    }

    #[test]
    fn mutation_shows_full_list_again() {
        let mut app = app_with(&["Pay rent", "Buy milk"]);
        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "milk");
        assert_eq!(app.visible_tasks().len(), 1);
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('d'));
        assert!(app.applied_filter.is_none());
        assert_eq!(app.visible_tasks().len(), 2);
        assert_eq!(app.store.tasks()[1].status, Status::Completed);
    }

    #[test]
    fn inline_edit_save_and_cancel() {
        let mut app = app_with(&["Pay rent"]);
        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.state, AppState::EditTask);
        type_text(&mut app, " now");
        assert!(screen(&mut app).contains("[Save] [Cancel]"));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.store.tasks()[0].title, "Pay rent");

        press(&mut app, KeyCode::Char('e'));
        type_text(&mut app, " now");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.store.tasks()[0].title, "Pay rent now");
        assert!(!app.editor.is_editing());
    }

    #[test]
    fn adding_arms_and_editing_rearms_reminder() {
        let mut app = app_with(&[]);
        let day = (Local::now() + chrono::Duration::days(2)).format("%Y-%m-%d").to_string();

        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "Dentist");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, &day);
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "10:00");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);

        let id = app.store.tasks()[0].id.clone();
        let first = app.scheduler.armed_at(&id).unwrap();
        assert_eq!(first.format("%H:%M").to_string(), "09:45");

        press(&mut app, KeyCode::Char('e'));
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        for _ in 0..5 {
            press(&mut app, KeyCode::Backspace);
        }
        type_text(&mut app, "11:00");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.store.tasks()[0].time.as_deref(), Some("11:00"));
        let second = app.scheduler.armed_at(&id).unwrap();
        assert_eq!(second - first, chrono::Duration::hours(1));
        assert_eq!(app.scheduler.len(), 1);
    }

    #[test]
    fn delete_cancels_reminder() {
        let mut app = app_with(&[]);
        let due = Local::now() + chrono::Duration::hours(2);
        let task = app
            .store
            .add(
                TaskDraft::new("Call bank", Some(Priority::Low))
                    .with_date(due.format("%Y-%m-%d").to_string())
                    .with_time(due.format("%H:%M").to_string()),
            )
            .unwrap();
        app.scheduler.schedule(&task, Local::now());
        assert_eq!(app.scheduler.len(), 1);
        app.list_state.select(Some(0));
        press(&mut app, KeyCode::Char('x'));
        assert!(app.store.is_empty());
        assert!(app.scheduler.is_empty());
    }

    #[test]
    fn reminders_alert_without_permission() {
        let mut app = app_with(&[]);
        let task = Task {
            id: TaskId::from("r1"),
            title: "Stand-up".into(),
            date: None,
            time: None,
            status: Status::Pending,
            priority: Priority::High,
        };
        let reminder = crate::reminder::Reminder {
            task_id: task.id.clone(),
            title: task.title.clone(),
            fire_at: Local::now(),
            lead_minutes: 15,
        };
        deliver(&reminder, app.permission, &mut app);
        assert_eq!(app.alerts.front().map(String::as_str), Some("⏰ 15 minutes left for: Stand-up"));

        app.permission = Permission::Granted;
        deliver(&reminder, app.permission, &mut app);
        assert!(app.status_message.contains("Task Reminder"));
    }
}
