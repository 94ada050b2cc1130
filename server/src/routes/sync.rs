//! Sync endpoint routes.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    routing::get,
    Json, Router,
};
use todosync_engine::SyncPayload;

use crate::error::{AppError, Result};
use crate::handlers::{handle_pull, handle_push, PullQuery, PushBody};
use crate::AppState;

/// Create sync routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/sync", get(pull_handler).post(push_handler))
}

/// POST /sync - Store a snapshot.
async fn push_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<PushBody>, JsonRejection>,
) -> Result<&'static str> {
    let Json(body) = body.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    handle_push(&state.storage, body).await
}

/// GET /sync - Fetch the latest snapshot if newer than `updatedAt`.
async fn pull_handler(
    State(state): State<AppState>,
    Query(query): Query<PullQuery>,
) -> Result<Json<SyncPayload>> {
    let payload = handle_pull(&state.storage, query).await?;
    Ok(Json(payload))
}
