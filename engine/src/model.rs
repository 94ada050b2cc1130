//! Todo lists and todo items.

use crate::{ids::new_id, ItemId, ListId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named todo list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoList {
    /// Unique identifier
    pub id: ListId,
    /// Display name
    #[serde(default)]
    pub name: String,
}

impl TodoList {
    /// Create a list with a freshly generated id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
        }
    }

    /// Create a list with a known id.
    pub fn with_id(id: impl Into<ListId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A single todo entry.
///
/// `list_id` is a weak reference: it is never checked against the store's
/// lists. Items whose list does not exist are simply not shown by any list
/// view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    /// Unique identifier
    pub id: ItemId,
    /// Short description
    #[serde(default)]
    pub description: String,
    /// List this item belongs to
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub list_id: ListId,
    /// Whether the item is finished
    #[serde(default)]
    pub done: bool,
    /// Optional due date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
}

impl TodoItem {
    /// Create an unfinished item in `list_id` with a fresh id.
    pub fn new(list_id: impl Into<ListId>, description: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            description: description.into(),
            list_id: list_id.into(),
            done: false,
            deadline: None,
        }
    }

    /// Whether this item belongs to the given list.
    pub fn is_in_list(&self, list_id: &str) -> bool {
        self.list_id == list_id
    }
}
