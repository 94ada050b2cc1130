//! Error types for the todosync engine.

use crate::ItemId;
use thiserror::Error;

/// All possible errors from the todosync engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Mutation errors
    #[error("todo item not found: {0}")]
    ItemNotFound(ItemId),

    // Snapshot errors
    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl Error {
    /// Whether this error is the user-facing "no such item" signal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ItemNotFound(_))
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
