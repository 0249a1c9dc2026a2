//! Configuration file handling.
//!
//! Settings come from `config.toml` (every key optional) and are then
//! overridden by command-line flags.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cli::Cli;
use crate::reminder::{DEFAULT_LEAD_MINUTES, MAX_LEAD_MINUTES};
use crate::storage::{is_valid_tasks_key, DEFAULT_TASKS_KEY, PERMISSION_KEY};

/// Name of the per-user directory under `$HOME`.
pub const APP_DIR: &str = ".tasklist";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the key files and the TUI log.
    pub data_dir: PathBuf,
    /// Key under which the task array is stored.
    pub storage_key: String,
    pub reminder_lead_minutes: i64,
    /// Log filter used when neither `RUST_LOG` nor `-v`/`-q` is given.
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: default_app_dir(),
            storage_key: DEFAULT_TASKS_KEY.to_string(),
            reminder_lead_minutes: DEFAULT_LEAD_MINUTES,
            log_level: "warn".to_string(),
            log_file: None,
        }
    }
}

impl Config {
    /// Load `path`, or `~/.tasklist/config.toml` when no path is given.
    ///
    /// A missing default file yields the defaults; a missing explicit file or
    /// an unparseable one is an error.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (default_app_dir().join("config.toml"), false),
        };
        if !explicit && !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            (0..=MAX_LEAD_MINUTES).contains(&self.reminder_lead_minutes),
            "reminder_lead_minutes must be between 0 and {MAX_LEAD_MINUTES}"
        );
        anyhow::ensure!(
            is_valid_tasks_key(&self.storage_key),
            "storage key {:?} must use only letters, digits, '-' and '_' and must not be {PERMISSION_KEY:?}",
            self.storage_key
        );
        Ok(())
    }

    /// Apply command-line overrides and check the result.
    pub fn apply_overrides(&mut self, cli: &Cli) -> anyhow::Result<()> {
        if let Some(dir) = &cli.data_dir {
            self.data_dir = dir.clone();
        }
        if let Some(key) = &cli.key {
            self.storage_key = key.clone();
        }
        if let Some(file) = &cli.log_file {
            self.log_file = Some(file.clone());
        }
        self.validate()
    }

    /// Log file used by the TUI when none is configured.
    pub fn tui_log_file(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("tasklist.log"))
    }
}

fn default_app_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(APP_DIR)
}
