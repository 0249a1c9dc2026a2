//! Command implementations for the CLI interface.
//!
//! Every mutating command persists through the `TaskStore` and then prints
//! the whole list again, the same way the TUI shows the full list after a
//! change.

use std::io::{self, BufRead, Write};
use std::thread;

use anyhow::{bail, Context};
use chrono::Local;
use clap::{Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use tracing::{debug, info};

use crate::error::LookupError;
use crate::fields::{DayBucket, Priority, StatusFilter};
use crate::filter::{filter_tasks_now, FilterCriteria};
use crate::reminder::{deliver, Notifier, Permission, ReminderScheduler};
use crate::render::{print_view, render, short_id};
use crate::storage::{load_permission, save_permission, KeyValueStore};
use crate::store::TaskStore;
use crate::task::{TaskDraft, TaskId};
use crate::tui::run::run_tui;

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive UI interface.
    Ui,

    /// Add a new task.
    Add {
        /// Short title for the task.
        title: String,
        /// Due date: YYYY-MM-DD.
        #[arg(long)]
        date: Option<String>,
        /// Due time: HH:MM.
        #[arg(long)]
        time: Option<String>,
        /// Priority: low | medium | high. Required.
        #[arg(long, value_enum)]
        priority: Option<Priority>,
    },

    /// List tasks, optionally filtered.
    List {
        /// Case-insensitive text contained in the title.
        #[arg(long, short, default_value = "")]
        search: String,
        /// Status: all | pending | completed.
        #[arg(long, value_enum, default_value_t = StatusFilter::All)]
        status: StatusFilter,
        /// Exact date (YYYY-MM-DD).
        #[arg(long)]
        date: Option<String>,
        /// Day bucket: all | today | tomorrow | week.
        #[arg(long, value_enum, default_value_t = DayBucket::All)]
        day: DayBucket,
        /// Priority: low | medium | high.
        #[arg(long, value_enum)]
        priority: Option<Priority>,
    },

    /// Flip a task between pending and completed.
    Toggle {
        /// Task ID, ID prefix or title.
        id: String,
    },

    /// Edit a task. Omitted fields keep their current values.
    Edit {
        /// Task ID, ID prefix or title.
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        time: Option<String>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Remove the date.
        #[arg(long, conflicts_with = "date")]
        clear_date: bool,
        /// Remove the time.
        #[arg(long, conflicts_with = "time")]
        clear_time: bool,
    },

    /// Delete a task. Deleting a task that does not exist is not an error.
    Delete {
        /// Task ID, ID prefix or title.
        id: String,
    },

    /// Stay in the foreground and deliver reminders as they come due.
    Watch,

    /// Show or set the notification permission.
    Permission {
        #[arg(value_enum)]
        action: Option<PermissionAction>,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PermissionAction {
    Grant,
    Deny,
    /// Forget the decision so the UI asks again.
    Reset,
}

/// Prints reminders to the console. Alerts wait for Enter.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&mut self, title: &str, body: &str) {
        println!("🔔 {title}: {body}");
    }

    fn alert(&mut self, message: &str) {
        println!("{message}");
        print!("Press Enter to continue...");
        let _ = io::stdout().flush();
        let mut line = String::new();
        let _ = io::stdin().lock().read_line(&mut line);
    }
}

/// Launch the terminal user interface.
pub fn cmd_ui<S: KeyValueStore>(store: TaskStore<S>, lead_minutes: i64) -> anyhow::Result<()> {
    run_tui(store, ReminderScheduler::new(lead_minutes)?).context("running the terminal UI")
}

/// Add a new task and print the list.
pub fn cmd_add<S: KeyValueStore>(
    store: &mut TaskStore<S>,
    title: String,
    date: Option<String>,
    time: Option<String>,
    priority: Option<Priority>,
) -> anyhow::Result<TaskId> {
    let draft = TaskDraft {
        title,
        date,
        time,
        priority,
    };
    let task = store.add(draft)?;
    println!("Added task {} ({})", task.title, short_id(&task.id));
    print_view(&render(store.tasks()));
    Ok(task.id)
}

/// Criteria built from `list` flags.
pub fn list_criteria(
    search: String,
    status: StatusFilter,
    date: Option<String>,
    day: DayBucket,
    priority: Option<Priority>,
) -> FilterCriteria {
    FilterCriteria {
        text: search,
        status,
        date: date.filter(|d| !d.trim().is_empty()),
        day,
        priority,
    }
}

/// Print the tasks matching `criteria`.
pub fn cmd_list<S: KeyValueStore>(store: &TaskStore<S>, criteria: &FilterCriteria) {
    debug!(?criteria, "listing tasks");
    print_view(&render(filter_tasks_now(store.tasks(), criteria)));
}

/// Toggle a task and print the list.
pub fn cmd_toggle<S: KeyValueStore>(store: &mut TaskStore<S>, identifier: &str) -> anyhow::Result<()> {
    let id = store.resolve(identifier)?;
    if let Some(status) = store.toggle_status(&id) {
        info!(id = %id, ?status, "task toggled from CLI");
    }
    print_view(&render(store.tasks()));
    Ok(())
}

/// Edit a task and print the list.
#[allow(clippy::too_many_arguments)]
pub fn cmd_edit<S: KeyValueStore>(
    store: &mut TaskStore<S>,
    identifier: &str,
    title: Option<String>,
    date: Option<String>,
    time: Option<String>,
    priority: Option<Priority>,
    clear_date: bool,
    clear_time: bool,
) -> anyhow::Result<()> {
    let id = store.resolve(identifier)?;
    let Some(task) = store.get(&id) else {
        bail!(LookupError::NotFound(identifier.to_string()));
    };

    let mut draft = TaskDraft::from_task(task);
    if let Some(title) = title {
        draft.title = title;
    }
    if clear_date {
        draft.date = None;
    } else if date.is_some() {
        draft.date = date;
    }
    if clear_time {
        draft.time = None;
    } else if time.is_some() {
        draft.time = time;
    }
    if priority.is_some() {
        draft.priority = priority;
    }

    store.edit(&id, draft)?;
    print_view(&render(store.tasks()));
    Ok(())
}

/// Delete a task and print the list. Unknown identifiers are ignored.
pub fn cmd_delete<S: KeyValueStore>(store: &mut TaskStore<S>, identifier: &str) -> anyhow::Result<()> {
    match store.resolve(identifier) {
        Ok(id) => {
            store.remove(&id);
        }
        Err(LookupError::NotFound(_)) => {
            debug!(identifier, "delete of unknown task ignored");
        }
        Err(e) => return Err(e.into()),
    }
    print_view(&render(store.tasks()));
    Ok(())
}

/// Arm reminders for every task and deliver them as they come due.
///
/// Returns once no reminder is left to wait for.
pub fn cmd_watch<S: KeyValueStore, N: Notifier>(
    store: &TaskStore<S>,
    lead_minutes: i64,
    notifier: &mut N,
) -> anyhow::Result<()> {
    let permission = load_permission(store.storage());
    let mut scheduler = ReminderScheduler::new(lead_minutes)?;
    let armed = scheduler.schedule_all(store.tasks(), Local::now());
    info!(armed, ?permission, "watching reminders");
    println!("Watching {armed} reminder(s). Press Ctrl+C to stop.");

    loop {
        for reminder in scheduler.take_due(Local::now()) {
            deliver(&reminder, permission, &mut *notifier);
        }
        let Some(next) = scheduler.next_fire() else {
            break;
        };
        let wait = (next - Local::now()).to_std().unwrap_or_default();
        debug!(?wait, "sleeping until next reminder");
        thread::sleep(wait);
    }
    println!("No reminders left.");
    Ok(())
}

/// Show or change the stored notification permission.
pub fn cmd_permission<S: KeyValueStore>(store: &mut TaskStore<S>, action: Option<PermissionAction>) -> Permission {
    let permission = match action {
        None => load_permission(store.storage()),
        Some(action) => {
            let permission = match action {
                PermissionAction::Grant => Permission::Granted,
                PermissionAction::Deny => Permission::Denied,
                PermissionAction::Reset => Permission::Default,
            };
            save_permission(store.storage_mut(), permission);
            permission
        }
    };
    println!("Notifications: {}", permission.as_label());
    permission
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut io::stdout());
}
