//! Task data structure and identifier generation.
//!
//! This module defines the `Task` record as it lives in memory and in the
//! persisted JSON array, the `TaskId` newtype, and `TaskDraft`, the set of
//! user-editable fields accepted by add and edit.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::fields::{Priority, Status};

/// Unique, immutable task identifier.
///
/// Normally a random uuid. Records written by the timestamp fallback carry a
/// JSON number instead of a string; both load as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TaskId(String);

impl TaskId {
    /// Generate a fresh identifier.
    ///
    /// Uses a random v4 uuid when the OS random source is available and falls
    /// back to the current Unix time in milliseconds otherwise. The fallback
    /// is not collision-free.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        match getrandom::getrandom(&mut bytes) {
            Ok(()) => TaskId(uuid::Builder::from_random_bytes(bytes).into_uuid().to_string()),
            Err(e) => {
                warn!(error = %e, "secure random source unavailable, using timestamp id");
                TaskId(Utc::now().timestamp_millis().to_string())
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        TaskId(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        TaskId(s)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Integer(i64),
            Float(f64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => TaskId(s),
            Raw::Integer(n) => TaskId(n.to_string()),
            Raw::Float(n) => TaskId(n.to_string()),
        })
    }
}

/// A single to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default, with = "blank_as_none")]
    pub date: Option<String>,
    #[serde(default, with = "blank_as_none")]
    pub time: Option<String>,
    #[serde(default)]
    pub status: Status,
    pub priority: Priority,
}

/// User-editable task fields, as collected from a form or the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub date: Option<String>,
    pub time: Option<String>,
    pub priority: Option<Priority>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, priority: Option<Priority>) -> Self {
        TaskDraft {
            title: title.into(),
            priority,
            ..TaskDraft::default()
        }
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    /// Draft pre-filled from an existing task.
    pub fn from_task(task: &Task) -> Self {
        TaskDraft {
            title: task.title.clone(),
            date: task.date.clone(),
            time: task.time.clone(),
            priority: Some(task.priority),
        }
    }
}

/// Map an empty (or whitespace-only) input to `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Absent date/time are written as `""` and read back from `""`, `null` or a
/// missing field.
mod blank_as_none {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_distinct_uuids() {
        let a = TaskId::generate();
        let b = TaskId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn absent_schedule_is_written_as_empty_strings() {
        let task = Task {
            id: TaskId::from("abc"),
            title: "Read".into(),
            date: None,
            time: None,
            status: Status::Pending,
            priority: Priority::Low,
        };
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["date"], "");
        assert_eq!(json["time"], "");
        assert_eq!(json["status"], "Pending");
        assert_eq!(json["priority"], "low");
    }

    #[test]
    fn loads_legacy_numeric_id_and_blank_fields() {
        let raw = r#"{"id":1712345678901,"title":"Pay rent","date":"2025-04-01","time":"","status":"Completed","priority":"high"}"#;
        let task: Task = serde_json::from_str(raw).unwrap();
        assert_eq!(task.id.as_str(), "1712345678901");
        assert_eq!(task.date.as_deref(), Some("2025-04-01"));
        assert_eq!(task.time, None);
        assert_eq!(task.status, Status::Completed);
        assert_eq!(task.priority, Priority::High);
    }

    #[test]
    fn non_blank_trims_and_drops_empty() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(Some(" 09:00 ".into())), Some("09:00".into()));
        assert_eq!(non_blank(None), None);
    }
}
