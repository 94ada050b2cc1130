//! todosync Server - stores the latest to-do snapshot pushed by any client.
//!
//! Clients poll `GET /sync?updatedAt=<version>` and upload whole snapshots
//! with `POST /sync`. The server never merges: the highest version wins.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod storage;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::{Config, ConfigError};
pub use error::AppError;
pub use storage::{SnapshotStore, StorageError};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<SnapshotStore>,
}

impl AppState {
    pub fn new(storage: SnapshotStore) -> Self {
        Self {
            storage: Arc::new(storage),
        }
    }
}

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
