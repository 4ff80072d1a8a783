//! Local snapshot of the last known task list.
//!
//! The cache is a whole-list snapshot: every write replaces the list and
//! stamps the "last sync time". Storage faults never reach the caller --
//! reads degrade to an empty snapshot and failed writes are dropped.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use taskman_proto::codec;
use taskman_proto::task::Task;

use crate::storage::Storage;

/// Storage key holding the JSON task list.
pub const TASKS_KEY: &str = "taskManagerPro_tasks";

/// Storage key holding the RFC 3339 timestamp of the last snapshot write.
pub const LAST_SYNC_KEY: &str = "taskManagerPro_lastSync";

/// Persisted snapshot of tasks, keyed by task id.
pub struct LocalCache<S> {
    storage: Arc<S>,
}

impl<S: Storage> LocalCache<S> {
    /// Creates a cache over the shared storage medium.
    pub const fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Returns the last persisted snapshot.
    ///
    /// Empty if nothing was ever written, the medium is unavailable, or the
    /// stored text is corrupt.
    pub fn read_all(&self) -> Vec<Task> {
        let raw = match self.storage.get(TASKS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read cached tasks");
                return Vec::new();
            }
        };
        codec::decode(&raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "cached task snapshot is corrupt; treating as empty");
            Vec::new()
        })
    }

    /// Replaces the whole snapshot and records now as the last sync time.
    pub fn write_all(&self, tasks: &[Task]) {
        let encoded = match codec::encode(tasks) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode task snapshot");
                return;
            }
        };
        if let Err(e) = self.storage.set(TASKS_KEY, &encoded) {
            tracing::warn!(error = %e, count = tasks.len(), "failed to save task snapshot");
            return;
        }
        if let Err(e) = self.storage.set(LAST_SYNC_KEY, &Utc::now().to_rfc3339()) {
            tracing::warn!(error = %e, "failed to record last sync time");
        }
    }

    /// Timestamp of the most recent successful [`write_all`](Self::write_all).
    pub fn last_sync_time(&self) -> Option<DateTime<Utc>> {
        let raw = match self.storage.get(LAST_SYNC_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read last sync time");
                return None;
            }
        };
        DateTime::parse_from_rfc3339(raw.trim())
            .map(|t| t.with_timezone(&Utc))
            .ok()
    }

    /// Erases the snapshot and the last sync time.
    pub fn clear(&self) {
        for key in [TASKS_KEY, LAST_SYNC_KEY] {
            if let Err(e) = self.storage.remove(key) {
                tracing::warn!(error = %e, key, "failed to clear cache entry");
            }
        }
    }

    /// Linear search of the snapshot by id.
    pub fn find(&self, id: &str) -> Option<Task> {
        self.read_all().into_iter().find(|t| t.id == id)
    }
}
