//! Pull handler - tells a client whether a newer snapshot exists.

use serde::Deserialize;
use todosync_engine::SyncPayload;

use crate::error::{AppError, Result};
use crate::storage::SnapshotStore;

/// Query parameters for pull sync.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullQuery {
    /// Version the client currently holds. Kept raw so a bad value
    /// becomes a readable 400 instead of an extractor rejection.
    pub updated_at: Option<String>,
}

/// Process a pull request from a client.
pub async fn handle_pull(storage: &SnapshotStore, query: PullQuery) -> Result<SyncPayload> {
    let since = parse_version(query.updated_at.as_deref())?;

    let payload = match storage.read_if_newer(since).await? {
        Some((version, data)) => {
            tracing::debug!("Serving snapshot {} to client at {}", version, since);
            SyncPayload::newer(data)
        }
        None => SyncPayload::none(),
    };

    Ok(payload)
}

fn parse_version(raw: Option<&str>) -> Result<u64> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| bad_version("missing"))?;

    raw.parse().map_err(|_| bad_version(raw))
}

fn bad_version(got: &str) -> AppError {
    AppError::BadRequest(format!(
        "please set updatedAt param to valid timestamp (got {got})"
    ))
}
