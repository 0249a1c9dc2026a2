//! Error types shared by the storage, store and command layers.

use std::io;

use thiserror::Error;

/// Rejection of an add or edit that would break the task invariants.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Enter task title and priority!")]
    MissingTitleOrPriority,
}

/// Failure of the underlying key-value store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("storage quota exceeded writing {key:?} ({needed} bytes, {available} available)")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },
}

/// Reminder lead outside `0..=MAX_LEAD_MINUTES`.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("reminder lead of {0} minutes is out of range")]
pub struct LeadOutOfRange(pub i64);

/// Failure to resolve a user-supplied task identifier.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("no task found matching '{0}'")]
    NotFound(String),
    #[error("'{identifier}' matches {count} tasks; use a longer id")]
    Ambiguous { identifier: String, count: usize },
}
