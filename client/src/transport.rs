//! Sync transport - the two remote operations the client depends on.
//!
//! [`HttpTransport`] talks to the todosync server:
//! - `GET /sync?updatedAt=<version>` answers whether something newer exists
//! - `POST /sync` uploads a full snapshot tagged with its version

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use todosync_engine::{PushRequest, SyncPayload, Timestamp};

use crate::error::{ClientError, Result};

const MAX_LOG_BODY_CHARS: usize = 512;

/// Remote side of synchronization.
#[async_trait]
pub trait SyncTransport: Send + Sync {
    /// Ask for a snapshot strictly newer than `since`.
    async fn fetch_if_newer(&self, since: Timestamp) -> Result<SyncPayload>;

    /// Upload the full serialized snapshot tagged with `version`.
    async fn push(&self, data: &str, version: Timestamp) -> Result<()>;
}

/// HTTP client for the todosync server.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport for the server at `base_url`
    /// (e.g. `http://localhost:3000`). Every request is bounded by `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn sync_url(&self) -> String {
        format!("{}/sync", self.base_url)
    }

    /// Turn a non-success response into an API error.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            debug!("Sync server response status: {}", status);
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("Sync server error ({}): {}", status, preview);
        Err(ClientError::api(status.as_u16(), preview))
    }
}

#[async_trait]
impl SyncTransport for HttpTransport {
    async fn fetch_if_newer(&self, since: Timestamp) -> Result<SyncPayload> {
        let response = self
            .client
            .get(self.sync_url())
            .query(&[("updatedAt", since)])
            .send()
            .await?;

        let payload = Self::check(response).await?.json::<SyncPayload>().await?;
        debug!(
            since,
            is_newer = payload.is_newer,
            bytes = payload.data.len(),
            "Fetched sync state"
        );
        Ok(payload)
    }

    async fn push(&self, data: &str, version: Timestamp) -> Result<()> {
        let request = PushRequest {
            data: data.to_string(),
            updated_at: version,
        };

        let response = self
            .client
            .post(self.sync_url())
            .json(&request)
            .send()
            .await?;

        Self::check(response).await?;
        debug!(version, bytes = data.len(), "Pushed snapshot");
        Ok(())
    }
}
