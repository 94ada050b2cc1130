//! Wire types shared by the sync client and the sync server.

use crate::Timestamp;
use serde::{Deserialize, Serialize};

/// Response of `GET /sync?updatedAt=<version>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPayload {
    /// Serialized snapshot, or empty when nothing newer exists
    pub data: String,
    /// Whether the server holds a version strictly newer than requested
    pub is_newer: bool,
}

impl SyncPayload {
    /// Nothing newer is available.
    pub fn none() -> Self {
        Self {
            data: String::new(),
            is_newer: false,
        }
    }

    /// A newer snapshot is available.
    pub fn newer(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            is_newer: true,
        }
    }

    /// Whether this payload carries a snapshot worth parsing.
    pub fn has_data(&self) -> bool {
        self.is_newer && !self.data.is_empty()
    }
}

/// Body of `POST /sync`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushRequest {
    /// Serialized snapshot
    pub data: String,
    /// Version of the snapshot, also its storage key
    pub updated_at: Timestamp,
}

/// Body returned by a successful `POST /sync`.
pub const PUSH_SUCCESS: &str = "SUCCESS";
