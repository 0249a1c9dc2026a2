//! Persistent key-value storage for the task collection.
//!
//! `KeyValueStore` is the seam over the local store; `FileStore` keeps one
//! JSON file per key, `MemoryStore` keeps values in process. `load_tasks` and
//! `save_tasks` never fail: corruption is discarded and write failures are
//! logged, leaving the in-memory collection authoritative.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use tracing::{debug, error, warn};

use crate::error::StorageError;
use crate::reminder::Permission;
use crate::task::Task;

/// Default key holding the task array.
pub const DEFAULT_TASKS_KEY: &str = "tasks";

/// Key holding the cached notification permission.
pub const PERMISSION_KEY: &str = "notification-permission";

/// Whether `key` may name a task list: ASCII letters, digits, `-` and `_`
/// only, and not a key used for other data. Such keys map to distinct files.
pub fn is_valid_tasks_key(key: &str) -> bool {
    !key.is_empty()
        && key != PERMISSION_KEY
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// A string-to-string persistent store.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Directory-backed store: each key lives in `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    /// Path of the file backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_key(key)))
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        // Atomic-ish write via temp + rename.
        let tmp = path.with_extension("json.tmp");
        let mut f = File::create(&tmp)?;
        f.write_all(value.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, path)?;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process store with an optional total byte quota.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// A store that refuses writes once keys plus values exceed `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        MemoryStore {
            items: HashMap::new(),
            quota: Some(bytes),
        }
    }

    fn used_without(&self, key: &str) -> usize {
        self.items
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            let needed = key.len() + value.len();
            let available = quota.saturating_sub(self.used_without(key));
            if needed > available {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    available,
                });
            }
        }
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.items.remove(key);
        Ok(())
    }
}

/// Load the task array stored under `key`.
///
/// Absent → empty. Unparseable → the stored value is removed and the result
/// is empty. A read failure is logged and yields empty.
pub fn load_tasks<S: KeyValueStore + ?Sized>(store: &mut S, key: &str) -> Vec<Task> {
    let raw = match store.get_item(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!(key, error = %e, "could not read tasks, starting empty");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<Task>>(&raw) {
        Ok(tasks) => {
            debug!(key, count = tasks.len(), "loaded tasks");
            tasks
        }
        Err(e) => {
            warn!(key, error = %e, "stored tasks are corrupt, discarding");
            if let Err(e) = store.remove_item(key) {
                error!(key, error = %e, "could not remove corrupt tasks");
            }
            Vec::new()
        }
    }
}

/// Overwrite `key` with the full task array. Failures are logged and
/// swallowed; there is no retry.
pub fn save_tasks<S: KeyValueStore + ?Sized>(store: &mut S, tasks: &[Task], key: &str) {
    let data = match serde_json::to_string(tasks) {
        Ok(data) => data,
        Err(e) => {
            error!(key, error = %e, "Save error: could not serialize tasks");
            return;
        }
    };
    match store.set_item(key, &data) {
        Ok(()) => debug!(key, count = tasks.len(), "saved tasks"),
        Err(e) => error!(key, error = %e, "Save error"),
    }
}

/// Read the cached notification permission; anything unreadable is `Default`.
pub fn load_permission<S: KeyValueStore + ?Sized>(store: &S) -> Permission {
    match store.get_item(PERMISSION_KEY) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "unreadable notification permission, treating as default");
            Permission::Default
        }),
        Ok(None) => Permission::Default,
        Err(e) => {
            warn!(error = %e, "could not read notification permission");
            Permission::Default
        }
    }
}

/// Persist the notification permission. `Default` clears the stored value.
pub fn save_permission<S: KeyValueStore + ?Sized>(store: &mut S, permission: Permission) {
    let result = match permission {
        Permission::Default => store.remove_item(PERMISSION_KEY),
        other => match serde_json::to_string(&other) {
            Ok(raw) => store.set_item(PERMISSION_KEY, &raw),
            Err(e) => {
                error!(error = %e, "could not serialize notification permission");
                return;
            }
        },
    };
    if let Err(e) = result {
        error!(error = %e, "could not save notification permission");
    }
}

/// Keep keys usable as file names.
fn sanitize_key(key: &str) -> String {
    let cleaned: String = key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        DEFAULT_TASKS_KEY.to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Priority, Status};
    use crate::task::TaskId;

    fn sample(id: &str, title: &str) -> Task {
        Task {
            id: TaskId::from(id),
            title: title.into(),
            date: Some("2025-04-01".into()),
            time: None,
            status: Status::Pending,
            priority: Priority::Medium,
        }
    }

    #[test]
    fn missing_key_loads_empty() {
        let mut store = MemoryStore::new();
        assert!(load_tasks(&mut store, "tasks").is_empty());
    }

    #[test]
    fn save_then_load_round_trips_in_order() {
        let mut store = MemoryStore::new();
        let tasks = vec![sample("1", "first"), sample("2", "second"), sample("3", "third")];
        save_tasks(&mut store, &tasks, "tasks");
        assert_eq!(load_tasks(&mut store, "tasks"), tasks);
    }

    #[test]
    fn corrupt_value_is_discarded_and_cleared() {
        let mut store = MemoryStore::new();
        store.set_item("tasks", "{not json").unwrap();
        assert!(load_tasks(&mut store, "tasks").is_empty());
        assert_eq!(store.get_item("tasks").unwrap(), None);
    }

    #[test]
    fn wrong_shape_counts_as_corruption() {
        let mut store = MemoryStore::new();
        store.set_item("tasks", r#"{"tasks": []}"#).unwrap();
        assert!(load_tasks(&mut store, "tasks").is_empty());
        assert_eq!(store.get_item("tasks").unwrap(), None);
    }

    #[test]
    fn quota_failure_is_swallowed() {
        let mut store = MemoryStore::with_quota(16);
        save_tasks(&mut store, &[sample("1", "far too long to fit in sixteen bytes")], "tasks");
        assert_eq!(store.get_item("tasks").unwrap(), None);
    }

    #[test]
    fn file_store_round_trips_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("data"));
        let tasks = vec![sample("a", "one")];
        save_tasks(&mut store, &tasks, "tasks");
        assert!(store.path_for("tasks").exists());
        assert_eq!(load_tasks(&mut store, "tasks"), tasks);

        store.remove_item("tasks").unwrap();
        store.remove_item("tasks").unwrap();
        assert!(load_tasks(&mut store, "tasks").is_empty());
    }

    #[test]
    fn file_store_clears_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path());
        fs::write(store.path_for("tasks"), "[{\"id\":").unwrap();
        assert!(load_tasks(&mut store, "tasks").is_empty());
        assert!(!store.path_for("tasks").exists());
    }

    #[test]
    fn permission_persists_and_resets() {
        let mut store = MemoryStore::new();
        assert_eq!(load_permission(&store), Permission::Default);
        save_permission(&mut store, Permission::Granted);
        assert_eq!(load_permission(&store), Permission::Granted);
        save_permission(&mut store, Permission::Default);
        assert_eq!(store.get_item(PERMISSION_KEY).unwrap(), None);
    }

    #[test]
    fn keys_are_sanitized_for_paths() {
        let store = FileStore::new("/tmp/x");
        assert_eq!(store.path_for("../evil key"), PathBuf::from("/tmp/x/___evil_key.json"));
    }

    #[test]
    fn task_keys_cannot_collide() {
        assert!(is_valid_tasks_key("tasks"));
        assert!(is_valid_tasks_key("work_2025-q1"));
        assert!(!is_valid_tasks_key(""));
        assert!(!is_valid_tasks_key(PERMISSION_KEY));
        assert!(!is_valid_tasks_key("a.b"));
        assert!(!is_valid_tasks_key("../tasks"));
    }
}
