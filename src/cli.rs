use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::cmd::Commands;

/// Daily task list with reminders.
/// Tasks are stored under ~/.tasklist unless --data-dir says otherwise.
#[derive(Parser)]
#[command(name = "tl", version, about = "Daily task list with filters and reminders")]
pub struct Cli {
    /// Path to a config.toml file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the task data.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Storage key of the task list.
    #[arg(long, global = true)]
    pub key: Option<String>,

    /// Write logs to this file instead of stderr.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Less log output (-q warn, -qq error).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub quiet: u8,

    /// Defaults to `ui`.
    #[command(subcommand)]
    pub command: Option<Commands>,
}
