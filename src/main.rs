//! # tl - Daily Task List
//!
//! A small task list for the day with priorities, filters and reminders, driven
//! either from the command line or from a terminal user interface (TUI).
//!
//! ## Key Features
//!
//! - **Quick capture**: title, optional date and time, and a required priority
//! - **Filters**: text search, status, exact date, today/tomorrow/week buckets and priority
//! - **Inline editing**: edit a task in place in the list, save or cancel
//! - **Reminders**: a notification (or a blocking alert) 15 minutes before a task is due
//! - **Local storage**: one JSON file per storage key under `~/.tasklist/`
//!
//! ## Quick Start
//!
//! ```bash
//! # Launch the TUI
//! tl
//!
//! # Add a task via CLI
//! tl add "Pay rent" --date 2025-04-01 --time 09:00 --priority high
//!
//! # Tasks due this week that are still pending
//! tl list --day week --status pending
//!
//! # Mark it done
//! tl toggle "pay rent"
//! ```
//!
//! ## Key Commands
//!
//! - `tl ui` - Launch the TUI (the default)
//! - `tl add <title>` - Create a task
//! - `tl list` - View tasks, with filters
//! - `tl toggle|edit|delete <id>` - Change a task by ID, ID prefix or title
//! - `tl watch` - Deliver reminders from the console
//! - `tl permission [grant|deny|reset]` - Notification permission
//!
//! Data is stored in `~/.tasklist/tasks.json` unless `--data-dir`/`--key` say
//! otherwise. Settings may be put in `~/.tasklist/config.toml`.

use std::fs;

use anyhow::Context;
use clap::Parser;
use tracing::debug;

pub mod cli;
pub mod cmd;
pub mod config;
pub mod edit;
pub mod error;
pub mod fields;
pub mod filter;
pub mod input;
pub mod logging;
pub mod reminder;
pub mod render;
pub mod storage;
pub mod store;
pub mod task;
pub mod task_form;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod filter_form;
    pub mod run;
    pub mod utils;
}

use cli::Cli;
use cmd::*;
use config::Config;
use storage::FileStore;
use store::TaskStore;

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_overrides(&cli)?;
    let command = cli.command.unwrap_or(Commands::Ui);

    // Completions need neither logging nor the data directory.
    if let Commands::Completions { shell } = command {
        cmd_completions(shell);
        return Ok(());
    }
    dispatch(command, &config, cli.verbose, cli.quiet)
}

fn dispatch(command: Commands, config: &Config, verbose: u8, quiet: u8) -> anyhow::Result<()> {
    fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("creating data directory {}", config.data_dir.display()))?;

    let level = logging::level_for(verbose, quiet, &config.log_level);
    let log_file = match command {
        Commands::Ui => Some(config.tui_log_file()),
        _ => config.log_file.clone(),
    };
    logging::init_tracing(level, log_file.as_deref())?;
    debug!(data_dir = %config.data_dir.display(), key = %config.storage_key, "configuration loaded");

    let mut store = TaskStore::open(FileStore::new(&config.data_dir), config.storage_key.clone());

    match command {
        Commands::Ui => cmd_ui(store, config.reminder_lead_minutes)?,

        Commands::Add { title, date, time, priority } => {
            cmd_add(&mut store, title, date, time, priority)?;
        }

        Commands::List { search, status, date, day, priority } => {
            cmd_list(&store, &list_criteria(search, status, date, day, priority))
        }

        Commands::Toggle { id } => cmd_toggle(&mut store, &id)?,

        Commands::Edit { id, title, date, time, priority, clear_date, clear_time } => {
            cmd_edit(&mut store, &id, title, date, time, priority, clear_date, clear_time)?
        }

        Commands::Delete { id } => cmd_delete(&mut store, &id)?,

        Commands::Watch => cmd_watch(&store, config.reminder_lead_minutes, &mut ConsoleNotifier)?,

        Commands::Permission { action } => {
            cmd_permission(&mut store, action);
        }

        Commands::Completions { shell } => cmd_completions(shell),
    }
    Ok(())
}
