//! # todosync Engine
//!
//! The deterministic core of todosync: an in-memory todo store replicated by
//! whole-snapshot, last-writer-wins synchronization.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine never touches files, network or the system clock
//!   on its own. Callers pass the current time into every mutation.
//! - **Whole snapshots**: there is no operation log and no merge. A remote
//!   snapshot either replaces the store entirely or is ignored.
//! - **Corruption tolerant**: a partial or unparsable snapshot is rejected
//!   before it can touch the store.
//!
//! ## Core Concepts
//!
//! ### Store
//!
//! [`Store`] owns the [`TodoList`]s, the [`TodoItem`]s and the version clock
//! `lastUpdate`. Every mutation moves the clock strictly forward (see
//! [`clock::next_version`]). Mutations that target an unknown item fail with
//! [`Error::ItemNotFound`] and leave the store untouched.
//!
//! ### Reconciliation
//!
//! [`Store::reconcile`] takes the server's [`SyncPayload`] and replaces the
//! store only when the payload carries a well-formed snapshot whose version
//! is strictly newer than the local one.
//!
//! ## Quick Start
//!
//! ```rust
//! use todosync_engine::{Store, SyncPayload, ReconcileOutcome};
//!
//! let mut store = Store::new();
//! let list = store.first_list_id().unwrap().clone();
//!
//! let item = store.add_item(list.clone(), "buy milk", 1706745600000);
//! store.toggle_done(&item, 1706745601000).unwrap();
//! assert_eq!(store.last_update(), 1706745601000);
//!
//! // Nothing newer on the server: nothing changes.
//! let outcome = store.reconcile(&SyncPayload::none());
//! assert_eq!(outcome, ReconcileOutcome::UpToDate);
//! assert_eq!(store.items_in_list(&list).count(), 1);
//! ```
//!
//! ## Persistence
//!
//! Use [`Store::export_state`] and [`Store::from_snapshot`] with
//! [`StoreSnapshot`]. The JSON produced by [`StoreSnapshot::to_json`] is the
//! format stored in the local cache and exchanged with the sync server.

pub mod clock;
pub mod error;
pub mod ids;
pub mod model;
pub mod reconcile;
pub mod snapshot;
pub mod store;
pub mod wire;

// Re-export main types at crate root
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::Error;
pub use model::{TodoItem, TodoList};
pub use reconcile::{ReconcileOutcome, Verdict};
pub use snapshot::{SnapshotMetadata, StoreSnapshot};
pub use store::{Store, DEFAULT_LIST_NAME};
pub use wire::{PushRequest, SyncPayload, PUSH_SUCCESS};

/// Type aliases for clarity
pub type ListId = String;
pub type ItemId = String;
pub type Timestamp = u64;
