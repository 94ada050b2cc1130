//! Snapshot types for persisting and exchanging store state.
//!
//! A snapshot is the whole store: every list, every item and the version
//! clock. The same JSON shape is written to the local cache and sent to the
//! sync server, so parsing must reject anything partial.

use crate::{error::Result, Error, Timestamp, TodoItem, TodoList};
use serde::{Deserialize, Serialize};

/// A point-in-time snapshot of the store state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    /// All lists, in display order
    pub todo_lists: Vec<TodoList>,
    /// All items, in insertion order
    pub todo_items: Vec<TodoItem>,
    /// Version clock of this state (milliseconds)
    pub last_update: Timestamp,
}

impl StoreSnapshot {
    /// Create an empty snapshot at version 0.
    pub fn empty() -> Self {
        Self {
            todo_lists: Vec::new(),
            todo_items: Vec::new(),
            last_update: 0,
        }
    }

    /// Serialize to compact JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize from JSON.
    ///
    /// Fails with [`Error::CorruptSnapshot`] if the input is not JSON, or if
    /// `todoLists`, `todoItems` or `lastUpdate` is missing or null.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::CorruptSnapshot(e.to_string()))
    }
}

/// Metadata about a snapshot (without the full data).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMetadata {
    /// Version clock
    pub last_update: Timestamp,
    /// Number of lists
    pub list_count: usize,
    /// Number of items
    pub item_count: usize,
    /// Number of finished items
    pub done_count: usize,
}

impl From<&StoreSnapshot> for SnapshotMetadata {
    fn from(snapshot: &StoreSnapshot) -> Self {
        Self {
            last_update: snapshot.last_update,
            list_count: snapshot.todo_lists.len(),
            item_count: snapshot.todo_items.len(),
            done_count: snapshot.todo_items.iter().filter(|i| i.done).count(),
        }
    }
}
