//! Enumerations and field types for tasks.
//!
//! This module defines the structured values a task carries (status and
//! priority) and the choices offered by the filter controls.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Task completion status.
///
/// Persisted as `"Pending"` / `"Completed"`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Status {
    #[default]
    #[serde(alias = "pending")]
    Pending,
    #[serde(alias = "completed")]
    Completed,
}

impl Status {
    /// The other status.
    pub fn toggled(self) -> Self {
        match self {
            Status::Pending => Status::Completed,
            Status::Completed => Status::Pending,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(format_status(*self))
    }
}

/// Priority classification, required on every task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(format_priority(*self))
    }
}

/// Options offered by priority selectors, in display order.
pub const PRIORITY_OPTIONS: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

/// Status filter choice. `All` disables the criterion.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

/// Relative day bucket used by the day filter.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum DayBucket {
    #[default]
    All,
    Today,
    Tomorrow,
    Week,
}

/// Format a task status for display.
pub fn format_status(s: Status) -> &'static str {
    match s {
        Status::Pending => "Pending",
        Status::Completed => "Completed",
    }
}

/// Format a priority for display.
pub fn format_priority(p: Priority) -> &'static str {
    match p {
        Priority::Low => "low",
        Priority::Medium => "medium",
        Priority::High => "high",
    }
}

/// Format a status filter choice for display.
pub fn format_status_filter(s: StatusFilter) -> &'static str {
    match s {
        StatusFilter::All => "all",
        StatusFilter::Pending => "pending",
        StatusFilter::Completed => "completed",
    }
}

/// Format a day bucket for display.
pub fn format_day_bucket(d: DayBucket) -> &'static str {
    match d {
        DayBucket::All => "all",
        DayBucket::Today => "today",
        DayBucket::Tomorrow => "tomorrow",
        DayBucket::Week => "week",
    }
}
