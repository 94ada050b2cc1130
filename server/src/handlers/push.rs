//! Push handler - stores a snapshot uploaded by a client.

use serde::Deserialize;
use todosync_engine::PUSH_SUCCESS;

use crate::error::{AppError, Result};
use crate::storage::{SnapshotStore, WriteOutcome};

/// Request body for push sync.
///
/// Both fields are optional at the serde level so that a missing one is
/// reported by name.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushBody {
    /// Serialized snapshot, stored verbatim
    pub data: Option<String>,
    /// Version of the snapshot
    pub updated_at: Option<u64>,
}

/// Process a push request from a client.
pub async fn handle_push(storage: &SnapshotStore, body: PushBody) -> Result<&'static str> {
    let (Some(data), Some(version)) = (body.data, body.updated_at) else {
        return Err(AppError::BadRequest(
            "body must contain {data, updatedAt}".to_string(),
        ));
    };

    match storage.write(version, &data).await? {
        WriteOutcome::Promoted => tracing::info!("Stored snapshot {}", version),
        WriteOutcome::Superseded { latest } => tracing::info!(
            "Stored snapshot {} (latest remains {})",
            version,
            latest
        ),
    }

    Ok(PUSH_SUCCESS)
}
