//! # todosync Client
//!
//! Runs a [`todosync_engine::Store`] on a device: restores it from a local
//! cache at startup, persists and pushes every change, and polls the sync
//! server for newer snapshots.
//!
//! ```no_run
//! use std::sync::Arc;
//! use todosync_client::{spawn_poller, ClientConfig, TodoClient};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_env()?;
//! let client = Arc::new(TodoClient::connect(&config).await?);
//! let poller = spawn_poller(Arc::clone(&client), config.poll_interval);
//!
//! let list = client.read(|s| s.first_list_id().cloned()).unwrap_or_default();
//! let item = client.add_item(list, "buy milk");
//! if let Err(e) = client.toggle_done(&item) {
//!     eprintln!("{e}");
//! }
//!
//! poller.shutdown().await;
//! client.flush().await;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod poller;
pub mod sync;
pub mod transport;

pub use cache::{FileCache, LocalCache, MemoryCache};
pub use config::{ClientConfig, ConfigError};
pub use error::{ClientError, Result};
pub use poller::{spawn_poller, PollCommand, PollerHandle};
pub use sync::{TodoClient, STORAGE_KEY};
pub use transport::{HttpTransport, SyncTransport};
