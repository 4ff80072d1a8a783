//! Persisted FIFO queue of mutations the server has not confirmed.
//!
//! Entries are appended with the enqueue time and never edited in place.
//! Removal is by target task id: [`PendingQueue::remove`] drops *every*
//! entry for that id, not just the one that was replayed.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use taskman_proto::codec;
use taskman_proto::pending::{PendingChange, PendingOperation};

use crate::storage::Storage;

/// Storage key holding the JSON list of pending operations.
pub const PENDING_KEY: &str = "taskManagerPro_pendingSync";

/// Returns the current timestamp in milliseconds since epoch.
pub(crate) fn now_ms() -> u64 {
    u64::try_from(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis(),
    )
    .unwrap_or(u64::MAX)
}

/// Ordered list of pending operations in persistent storage.
pub struct PendingQueue<S> {
    storage: Arc<S>,
}

impl<S: Storage> PendingQueue<S> {
    /// Creates a queue over the shared storage medium.
    pub const fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Appends an operation stamped with the current time.
    pub fn enqueue(&self, task_id: impl Into<String>, change: PendingChange) {
        let mut pending = self.list();
        let op = PendingOperation {
            id: task_id.into(),
            change,
            timestamp: now_ms(),
        };
        tracing::debug!(task_id = %op.id, kind = %op.kind(), "queueing pending operation");
        pending.push(op);
        self.save(&pending);
    }

    /// Returns all pending operations in enqueue order.
    ///
    /// Empty if none are stored or the stored list cannot be read.
    pub fn list(&self) -> Vec<PendingOperation> {
        let raw = match self.storage.get(PENDING_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read pending operations");
                return Vec::new();
            }
        };
        codec::decode(&raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "pending operation list is corrupt; treating as empty");
            Vec::new()
        })
    }

    /// Removes every entry targeting `task_id`.
    pub fn remove(&self, task_id: &str) {
        let mut pending = self.list();
        let before = pending.len();
        pending.retain(|op| op.id != task_id);
        if pending.len() != before {
            tracing::debug!(task_id, removed = before - pending.len(), "removed pending operations");
        }
        self.save(&pending);
    }

    /// Empties the queue.
    pub fn clear(&self) {
        if let Err(e) = self.storage.remove(PENDING_KEY) {
            tracing::warn!(error = %e, "failed to clear pending operations");
        }
    }

    /// Number of queued operations.
    pub fn len(&self) -> usize {
        self.list().len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.list().is_empty()
    }

    fn save(&self, pending: &[PendingOperation]) {
        let encoded = match codec::encode(pending) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode pending operations");
                return;
            }
        };
        if let Err(e) = self.storage.set(PENDING_KEY, &encoded) {
            tracing::warn!(error = %e, count = pending.len(), "failed to save pending operations");
        }
    }
}
