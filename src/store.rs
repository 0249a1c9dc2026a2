//! The owned, in-memory task collection.
//!
//! `TaskStore` is the single source of truth during a session. Its mutation
//! methods are the only write path and each one mirrors the full collection
//! to the backing `KeyValueStore`. Re-rendering and reminder bookkeeping are
//! left to the caller.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::error::{LookupError, ValidationError};
use crate::fields::Status;
use crate::storage::{load_tasks, save_tasks, KeyValueStore};
use crate::task::{non_blank, Task, TaskDraft, TaskId};

pub struct TaskStore<S: KeyValueStore> {
    tasks: Vec<Task>,
    storage: S,
    key: String,
}

impl<S: KeyValueStore> TaskStore<S> {
    /// Load the collection stored under `key`. Later records sharing an id
    /// with an earlier one are given fresh ids.
    pub fn open(mut storage: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let tasks = load_tasks(&mut storage, &key);
        info!(key = %key, count = tasks.len(), "task store opened");
        let mut store = TaskStore { tasks, storage, key };
        if store.repair_duplicate_ids() > 0 {
            store.persist();
        }
        store
    }

    fn repair_duplicate_ids(&mut self) -> usize {
        let mut seen = HashSet::new();
        let mut repaired = 0;
        for i in 0..self.tasks.len() {
            if seen.insert(self.tasks[i].id.clone()) {
                continue;
            }
            let id = self.fresh_id();
            warn!(old = %self.tasks[i].id, new = %id, "duplicate task id replaced");
            seen.insert(id.clone());
            self.tasks[i].id = id;
            repaired += 1;
        }
        repaired
    }

    /// All tasks in insertion order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    fn get_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| &t.id == id)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Create a pending task from `draft` and append it.
    pub fn add(&mut self, draft: TaskDraft) -> Result<Task, ValidationError> {
        let title = draft.title.trim().to_string();
        let priority = match draft.priority {
            Some(p) if !title.is_empty() => p,
            _ => return Err(ValidationError::MissingTitleOrPriority),
        };

        let task = Task {
            id: self.fresh_id(),
            title,
            date: non_blank(draft.date),
            time: non_blank(draft.time),
            status: Status::Pending,
            priority,
        };
        debug!(id = %task.id, "task added");
        self.tasks.push(task.clone());
        self.persist();
        Ok(task)
    }

    /// Flip Pending and Completed. Returns the new status, or `None` when no
    /// task has this id.
    pub fn toggle_status(&mut self, id: &TaskId) -> Option<Status> {
        let task = self.get_mut(id)?;
        task.status = task.status.toggled();
        let status = task.status;
        debug!(id = %id, ?status, "task toggled");
        self.persist();
        Some(status)
    }

    /// Remove the task with this id. Removing an unknown id is a no-op.
    pub fn remove(&mut self, id: &TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| &t.id != id);
        let removed = self.tasks.len() != before;
        if removed {
            debug!(id = %id, "task removed");
            self.persist();
        }
        removed
    }

    /// Overwrite title, date, time and priority of the task with this id.
    ///
    /// Returns `Ok(false)` when no task has this id. A blank title or missing
    /// priority is rejected the same way `add` rejects it.
    pub fn edit(&mut self, id: &TaskId, draft: TaskDraft) -> Result<bool, ValidationError> {
        let title = draft.title.trim().to_string();
        let priority = match draft.priority {
            Some(p) if !title.is_empty() => p,
            _ => return Err(ValidationError::MissingTitleOrPriority),
        };
        let Some(task) = self.get_mut(id) else {
            return Ok(false);
        };
        task.title = title;
        task.date = non_blank(draft.date);
        task.time = non_blank(draft.time);
        task.priority = priority;
        debug!(id = %id, "task edited");
        self.persist();
        Ok(true)
    }

    /// Resolve an identifier typed by a user: exact id, unique id prefix, or
    /// unique case-insensitive title.
    pub fn resolve(&self, identifier: &str) -> Result<TaskId, LookupError> {
        let identifier = identifier.trim();
        if let Some(task) = self.tasks.iter().find(|t| t.id.as_str() == identifier) {
            return Ok(task.id.clone());
        }

        let by_prefix: Vec<&Task> = if identifier.is_empty() {
            Vec::new()
        } else {
            self.tasks.iter().filter(|t| t.id.as_str().starts_with(identifier)).collect()
        };
        let candidates = if by_prefix.is_empty() {
            let lowered = identifier.to_lowercase();
            self.tasks.iter().filter(|t| t.title.to_lowercase() == lowered).collect()
        } else {
            by_prefix
        };

        match candidates.as_slice() {
            [] => Err(LookupError::NotFound(identifier.to_string())),
            [task] => Ok(task.id.clone()),
            many => Err(LookupError::Ambiguous {
                identifier: identifier.to_string(),
                count: many.len(),
            }),
        }
    }

    fn fresh_id(&self) -> TaskId {
        let base = TaskId::generate();
        if self.get(&base).is_none() {
            return base;
        }
        let mut n = 1u32;
        loop {
            let candidate = TaskId::from(format!("{base}-{n}"));
            if self.get(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }

    fn persist(&mut self) {
        save_tasks(&mut self.storage, &self.tasks, &self.key);
    }
}
