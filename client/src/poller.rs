//! Periodic reconciliation.
//!
//! The sync server never pushes changes to clients, so the client polls it
//! on a fixed period instead.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

use crate::sync::TodoClient;

/// Commands sent to the poll task
#[derive(Debug)]
pub enum PollCommand {
    /// Reconcile right away and restart the period
    SyncNow,
    /// Stop polling
    Shutdown,
}

/// Handle for controlling the background poll task.
///
/// Dropping the handle also stops the task once any reconcile in progress
/// has finished.
#[derive(Debug)]
pub struct PollerHandle {
    command_tx: mpsc::Sender<PollCommand>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Ask for an immediate reconcile. Returns false if the poller stopped.
    pub async fn sync_now(&self) -> bool {
        self.command_tx.send(PollCommand::SyncNow).await.is_ok()
    }

    /// Stop polling and wait for the task to exit.
    pub async fn shutdown(self) {
        let _ = self.command_tx.send(PollCommand::Shutdown).await;
        let _ = self.task.await;
    }

    /// Whether the poll task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawn a background task that reconciles `client` every `period`.
///
/// The first reconcile happens one period after spawning;
/// [`TodoClient::open`] already reconciles once.
pub fn spawn_poller(client: Arc<TodoClient>, period: Duration) -> PollerHandle {
    let (command_tx, command_rx) = mpsc::channel(16);
    let period = period.max(Duration::from_millis(1));

    let task = tokio::spawn(poller_task(client, period, command_rx));

    PollerHandle { command_tx, task }
}

async fn poller_task(
    client: Arc<TodoClient>,
    period: Duration,
    mut command_rx: mpsc::Receiver<PollCommand>,
) {
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    // A slow reconcile must not be followed by a burst of catch-up ticks.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    debug!(?period, "Sync poller started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let outcome = client.reconcile().await;
                trace!(?outcome, "Poll tick");
            }
            cmd = command_rx.recv() => match cmd {
                Some(PollCommand::SyncNow) => {
                    let outcome = client.reconcile().await;
                    trace!(?outcome, "Manual sync");
                    ticker.reset();
                }
                Some(PollCommand::Shutdown) | None => break,
            },
        }
    }

    debug!("Sync poller stopped");
}
