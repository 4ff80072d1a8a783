//! Online/offline signal and the background tasks that react to it.
//!
//! # Architecture
//!
//! ```text
//! health probe ── set_online ──▶ Connectivity (watch<bool>)
//!                                      │ subscribe
//!                                      ▼
//!                          reconnect task ── sync() ──▶ SyncEvent
//! ```
//!
//! Only an offline to online transition triggers a replay. The watch channel
//! keeps the latest value, so a flap that happens faster than the reconnect
//! task wakes up may be observed as no transition at all.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::remote::{HealthCheck, RemoteApi, RemoteError};
use crate::storage::Storage;
use crate::sync::{SyncCoordinator, SyncReport};

/// Capacity of the [`SyncEvent`] channel.
const EVENT_BUFFER: usize = 16;

/// Shortest probe period; `tokio::time::interval` rejects zero.
const MIN_PROBE_INTERVAL: Duration = Duration::from_millis(1);

/// Shared connectivity flag.
pub struct Connectivity {
    tx: watch::Sender<bool>,
}

impl Connectivity {
    /// Creates the signal with an initial state.
    #[must_use]
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx }
    }

    /// Publishes a new state. Subscribers are only woken when it changes.
    pub fn set_online(&self, online: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
        if changed {
            tracing::info!(online, "connectivity changed");
        }
    }

    /// Current state.
    #[must_use]
    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// A receiver that observes future changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Outcome of a reconnect-triggered sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// The replay pass ran (and the cache was refreshed if anything was queued).
    Completed(SyncReport),
    /// The replay pass ran but the final refresh failed.
    RefreshFailed(RemoteError),
}

/// Runs one [`SyncCoordinator::sync`] per offline to online transition seen
/// on `online`.
///
/// The task exits once the [`Connectivity`] sender is dropped. Results are
/// reported on the returned channel. Events that find the channel full or
/// closed are dropped, so a receiver that is never read does not stall
/// later reconnects.
pub fn spawn_sync_on_reconnect<R, S>(
    coordinator: Arc<SyncCoordinator<R, S>>,
    mut online: watch::Receiver<bool>,
) -> (JoinHandle<()>, mpsc::Receiver<SyncEvent>)
where
    R: RemoteApi + 'static,
    S: Storage + 'static,
{
    let (evt_tx, evt_rx) = mpsc::channel(EVENT_BUFFER);

    let handle = tokio::spawn(async move {
        let mut was_online = *online.borrow_and_update();
        while online.changed().await.is_ok() {
            let now_online = *online.borrow_and_update();
            if now_online && !was_online {
                tracing::info!("back online; syncing pending operations");
                let event = match coordinator.sync().await {
                    Ok(report) => SyncEvent::Completed(report),
                    Err(e) => SyncEvent::RefreshFailed(e),
                };
                match evt_tx.try_send(event) {
                    Ok(()) | Err(mpsc::error::TrySendError::Closed(_)) => {}
                    Err(mpsc::error::TrySendError::Full(event)) => {
                        tracing::warn!(?event, "sync event channel full; dropping event");
                    }
                }
            }
            was_online = now_online;
        }
        tracing::debug!("connectivity signal closed; reconnect task exiting");
    });

    (handle, evt_rx)
}

/// Polls `remote` every `interval` and publishes reachability to
/// `connectivity`. Runs until the handle is aborted.
///
/// A zero `interval` is treated as [`MIN_PROBE_INTERVAL`].
pub fn spawn_health_probe<H>(
    remote: Arc<H>,
    interval: Duration,
    connectivity: Arc<Connectivity>,
) -> JoinHandle<()>
where
    H: HealthCheck + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval.max(MIN_PROBE_INTERVAL));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let reachable = remote.is_reachable().await;
            tracing::trace!(reachable, "health probe");
            connectivity.set_online(reachable);
        }
    })
}
