//! Client runtime: the store plus its local cache and sync server.
//!
//! [`TodoClient`] is what the presentation layer holds. Mutations apply to
//! the in-memory store immediately and return; the new snapshot is then
//! handed to a background writer that saves it to the local cache and pushes
//! it to the sync server. Reconciliation pulls newer snapshots from the
//! server and swaps them in wholesale.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use todosync_engine::{
    Clock, ItemId, ListId, ReconcileOutcome, Store, StoreSnapshot, SystemClock, Timestamp,
};

use crate::cache::{FileCache, LocalCache};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::transport::{HttpTransport, SyncTransport};

/// Cache key the store is persisted under.
pub const STORAGE_KEY: &str = "TODO_LISTS";

/// A serialized snapshot waiting to be persisted and pushed.
#[derive(Debug, Clone)]
struct PendingWrite {
    json: String,
    version: Timestamp,
}

impl PendingWrite {
    fn capture(store: &Store) -> Option<Self> {
        match store.to_json() {
            Ok(json) => Some(Self {
                json,
                version: store.last_update(),
            }),
            Err(e) => {
                warn!(error = %e, "Failed to serialize store; skipping persistence");
                None
            }
        }
    }
}

/// Commands for the background writer.
#[derive(Debug)]
enum WriteCommand {
    /// Persist and push a snapshot
    Persist(PendingWrite),
    /// Acknowledge once everything queued before it is done
    Flush(oneshot::Sender<()>),
}

/// Clears the reconcile in-flight flag when dropped, even on cancellation.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The client-side owner of the todo store.
pub struct TodoClient {
    store: Mutex<Store>,
    transport: Arc<dyn SyncTransport>,
    clock: Arc<dyn Clock>,
    writes: mpsc::UnboundedSender<WriteCommand>,
    reconciling: AtomicBool,
    push_pending: Arc<AtomicBool>,
    request_timeout: Duration,
}

impl TodoClient {
    /// Open the client: restore the cached store, start the background
    /// writer, then reconcile once with the server.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn open(
        cache: Arc<dyn LocalCache>,
        transport: Arc<dyn SyncTransport>,
        clock: Arc<dyn Clock>,
        request_timeout: Duration,
    ) -> Self {
        let store = load_cached(cache.as_ref()).await.unwrap_or_default();
        debug!(
            last_update = store.last_update(),
            "Store ready"
        );

        let push_pending = Arc::new(AtomicBool::new(false));
        let (writes, write_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(
            write_rx,
            cache,
            Arc::clone(&transport),
            Arc::clone(&push_pending),
            request_timeout,
        ));

        let client = Self {
            store: Mutex::new(store),
            transport,
            clock,
            writes,
            reconciling: AtomicBool::new(false),
            push_pending,
            request_timeout,
        };

        client.reconcile().await;
        client
    }

    /// Open a client with a file cache and HTTP transport built from `config`.
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let cache = Arc::new(FileCache::new(&config.cache_dir));
        let transport = Arc::new(HttpTransport::new(
            &config.server_url,
            config.request_timeout,
        )?);
        info!(server = %config.server_url, cache = %config.cache_dir.display(), "Connecting todo client");

        Ok(Self::open(cache, transport, Arc::new(SystemClock), config.request_timeout).await)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Run `f` against the current store.
    pub fn read<R>(&self, f: impl FnOnce(&Store) -> R) -> R {
        f(&self.lock_store())
    }

    /// Clone of the current store.
    pub fn snapshot(&self) -> Store {
        self.lock_store().clone()
    }

    /// Current version clock.
    pub fn last_update(&self) -> Timestamp {
        self.lock_store().last_update()
    }

    /// Whether the last push failed and has not been retried successfully.
    pub fn is_push_pending(&self) -> bool {
        self.push_pending.load(Ordering::Acquire)
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Append a new unfinished item to `list_id`.
    pub fn add_item(&self, list_id: impl Into<ListId>, description: impl Into<String>) -> ItemId {
        let now = self.clock.now_millis();
        let mut store = self.lock_store();
        let id = store.add_item(list_id, description, now);
        self.commit(store);
        id
    }

    /// Flip the done flag of an item.
    pub fn toggle_done(&self, item_id: &str) -> Result<()> {
        let now = self.clock.now_millis();
        let mut store = self.lock_store();
        store
            .toggle_done(item_id, now)
            .map_err(|e| rejected("toggle", e))?;
        self.commit(store);
        Ok(())
    }

    /// Replace an item's description.
    pub fn edit_description(&self, item_id: &str, description: impl Into<String>) -> Result<()> {
        let now = self.clock.now_millis();
        let mut store = self.lock_store();
        store
            .edit_description(item_id, description, now)
            .map_err(|e| rejected("edit", e))?;
        self.commit(store);
        Ok(())
    }

    /// Remove an item.
    pub fn remove_item(&self, item_id: &str) -> Result<()> {
        let now = self.clock.now_millis();
        let mut store = self.lock_store();
        store
            .remove_item(item_id, now)
            .map_err(|e| rejected("remove", e))?;
        self.commit(store);
        Ok(())
    }

    /// Move an item to another list.
    pub fn move_item(&self, item_id: &str, list_id: impl Into<ListId>) -> Result<()> {
        let now = self.clock.now_millis();
        let mut store = self.lock_store();
        store
            .move_item(item_id, list_id, now)
            .map_err(|e| rejected("move item to list", e))?;
        self.commit(store);
        Ok(())
    }

    /// Set or clear an item's deadline.
    pub fn set_deadline(&self, item_id: &str, deadline: Option<DateTime<Utc>>) -> Result<()> {
        let now = self.clock.now_millis();
        let mut store = self.lock_store();
        store
            .set_deadline(item_id, deadline, now)
            .map_err(|e| rejected("setting deadline", e))?;
        self.commit(store);
        Ok(())
    }

    /// Append a new list.
    pub fn create_list(&self, name: impl Into<String>) -> ListId {
        let now = self.clock.now_millis();
        let mut store = self.lock_store();
        let id = store.create_list(name, now);
        self.commit(store);
        id
    }

    // ------------------------------------------------------------------
    // Synchronization
    // ------------------------------------------------------------------

    /// Pull from the sync server and replace the store if the server holds a
    /// strictly newer snapshot.
    ///
    /// Never fails: an unreachable server counts as "nothing newer", a
    /// corrupt payload is logged and dropped. Returns
    /// [`ReconcileOutcome::Skipped`] if another reconcile is in flight.
    pub async fn reconcile(&self) -> ReconcileOutcome {
        if self
            .reconciling
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Reconcile already in flight; skipping");
            return ReconcileOutcome::Skipped;
        }
        let _in_flight = InFlight(&self.reconciling);

        let since = self.last_update();
        let fetched = tokio::time::timeout(self.request_timeout, self.transport.fetch_if_newer(since))
            .await
            .unwrap_or(Err(ClientError::Timeout(self.request_timeout)));

        let payload = match fetched {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "There was an issue communicating with the sync server");
                return ReconcileOutcome::UpToDate;
            }
        };

        let outcome = {
            let mut store = self.lock_store();
            let outcome = store.reconcile(&payload);
            let write = match &outcome {
                ReconcileOutcome::Replaced { .. } => PendingWrite::capture(&store),
                ReconcileOutcome::UpToDate | ReconcileOutcome::Stale { .. }
                    if self.is_push_pending() && store.last_update() > 0 =>
                {
                    PendingWrite::capture(&store)
                }
                _ => None,
            };
            // Queued under the lock so writes reach the writer in version order.
            if let Some(write) = write {
                self.enqueue(write);
            }
            outcome
        };

        match &outcome {
            ReconcileOutcome::Replaced { previous, current } => info!(
                previous = *previous,
                current = current.last_update,
                lists = current.list_count,
                items = current.item_count,
                "Replaced store with newer snapshot from sync server"
            ),
            ReconcileOutcome::Discarded { reason } => {
                warn!(%reason, "Retrieved sync data was corrupt")
            }
            ReconcileOutcome::Stale { remote, local } => {
                debug!(remote = *remote, local = *local, "Remote snapshot is stale")
            }
            ReconcileOutcome::UpToDate | ReconcileOutcome::Skipped => {}
        }

        outcome
    }

    /// Wait until every snapshot queued so far has been persisted and pushed
    /// (or failed to).
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.writes.send(WriteCommand::Flush(tx)).is_ok() {
            let _ = rx.await;
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn lock_store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue the mutated store for persistence, then release the lock.
    ///
    /// The send happens under the lock: a snapshot captured earlier must
    /// never reach the writer after a later one.
    fn commit(&self, store: MutexGuard<'_, Store>) {
        if let Some(write) = PendingWrite::capture(&store) {
            self.enqueue(write);
        }
        drop(store);
    }

    fn enqueue(&self, write: PendingWrite) {
        if self.writes.send(WriteCommand::Persist(write)).is_err() {
            warn!("Background writer has stopped; snapshot not persisted");
        }
    }
}

impl std::fmt::Debug for TodoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoClient")
            .field("last_update", &self.last_update())
            .field("push_pending", &self.is_push_pending())
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

/// Log a rejected mutation and convert its error.
fn rejected(action: &str, e: todosync_engine::Error) -> ClientError {
    warn!(error = %e, "Todo item id mismatch on {}", action);
    e.into()
}

/// Restore the store from the cache. Unusable blobs are ignored.
async fn load_cached(cache: &dyn LocalCache) -> Option<Store> {
    let blob = match cache.get(STORAGE_KEY).await {
        Ok(Some(blob)) => blob,
        Ok(None) => return None,
        Err(e) => {
            warn!(error = %e, "Failed to read local cache");
            return None;
        }
    };

    match StoreSnapshot::from_json(&blob) {
        Ok(snapshot) if snapshot.last_update > 0 => Some(Store::from_snapshot(snapshot)),
        Ok(_) => None,
        Err(e) => {
            warn!(error = %e, "There was an issue restoring the cached store");
            None
        }
    }
}

/// Background task that persists and pushes snapshots in order.
///
/// Snapshots queued while a write is in progress are coalesced so only the
/// newest one is written.
async fn run_writer(
    mut rx: mpsc::UnboundedReceiver<WriteCommand>,
    cache: Arc<dyn LocalCache>,
    transport: Arc<dyn SyncTransport>,
    push_pending: Arc<AtomicBool>,
    request_timeout: Duration,
) {
    while let Some(command) = rx.recv().await {
        let mut write = match command {
            WriteCommand::Persist(write) => write,
            WriteCommand::Flush(ack) => {
                let _ = ack.send(());
                continue;
            }
        };

        let mut acks = Vec::new();
        while let Ok(next) = rx.try_recv() {
            match next {
                WriteCommand::Persist(newer) => write = newer,
                WriteCommand::Flush(ack) => {
                    acks.push(ack);
                    break;
                }
            }
        }

        persist_and_push(
            cache.as_ref(),
            transport.as_ref(),
            &push_pending,
            &write,
            request_timeout,
        )
        .await;

        for ack in acks {
            let _ = ack.send(());
        }
    }
    debug!("Background writer stopped");
}

async fn persist_and_push(
    cache: &dyn LocalCache,
    transport: &dyn SyncTransport,
    push_pending: &AtomicBool,
    write: &PendingWrite,
    request_timeout: Duration,
) {
    if let Err(e) = cache.set(STORAGE_KEY, &write.json).await {
        warn!(error = %e, "Error in saving to local cache");
    }

    // The untouched first-launch store is never pushed.
    if write.version == 0 {
        return;
    }

    let pushed = tokio::time::timeout(request_timeout, transport.push(&write.json, write.version))
        .await
        .unwrap_or(Err(ClientError::Timeout(request_timeout)));

    match pushed {
        Ok(()) => push_pending.store(false, Ordering::Release),
        Err(e) => {
            push_pending.store(true, Ordering::Release);
            warn!(error = %e, version = write.version, "Failed to push snapshot to sync server");
        }
    }
}
