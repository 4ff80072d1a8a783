//! Offline-first coordinator between the remote API, the local cache and the
//! pending-operation queue.
//!
//! Every call tries the remote first. Reads fall back to the cache. Mutations
//! that fail are applied optimistically to the cache, queued, and the
//! original [`RemoteError`] is returned so the caller can tell the user.
//! [`SyncCoordinator::sync`] replays the queue once connectivity returns.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use taskman_proto::api::MessageResponse;
use taskman_proto::pending::{PendingChange, PendingOperation};
use taskman_proto::task::{CreateTask, Task, UpdateTask};

use crate::cache::LocalCache;
use crate::queue::{PendingQueue, now_ms};
use crate::remote::{RemoteApi, RemoteError};
use crate::storage::Storage;

/// Prefix of ids assigned to tasks created while offline.
pub const TEMP_ID_PREFIX: &str = "temp_";

/// Outcome of one replay pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Queue entries replayed.
    pub attempted: usize,
    /// Entries the server accepted.
    pub succeeded: usize,
    /// Entries the server rejected.
    pub failed: usize,
}

/// Owns the remote, the cache and the queue for one client session.
pub struct SyncCoordinator<R, S> {
    remote: R,
    cache: LocalCache<S>,
    queue: PendingQueue<S>,
    last_temp_ms: AtomicU64,
}

impl<R: RemoteApi, S: Storage> SyncCoordinator<R, S> {
    /// Creates a coordinator whose cache and queue share `storage`.
    pub fn new(remote: R, storage: Arc<S>) -> Self {
        Self {
            remote,
            cache: LocalCache::new(Arc::clone(&storage)),
            queue: PendingQueue::new(storage),
            last_temp_ms: AtomicU64::new(0),
        }
    }

    /// The local task snapshot.
    pub const fn cache(&self) -> &LocalCache<S> {
        &self.cache
    }

    /// The pending-operation queue.
    pub const fn queue(&self) -> &PendingQueue<S> {
        &self.queue
    }

    /// The remote API.
    pub const fn remote(&self) -> &R {
        &self.remote
    }

    /// Fetches every task, refreshing the cache. Falls back to the cached
    /// snapshot when the remote is unavailable.
    pub async fn list_tasks(&self) -> Vec<Task> {
        match self.remote.list_tasks().await {
            Ok(tasks) => {
                self.cache.write_all(&tasks);
                tasks
            }
            Err(e) => {
                tracing::warn!(error = %e, "list failed; serving cached tasks");
                self.cache.read_all()
            }
        }
    }

    /// Fetches one task, falling back to the cache.
    ///
    /// # Errors
    ///
    /// Returns the remote error if the task is not cached either.
    pub async fn get_task(&self, id: &str) -> Result<Task, RemoteError> {
        match self.remote.get_task(id).await {
            Ok(task) => Ok(task),
            Err(e) => {
                tracing::debug!(task_id = %id, error = %e, "get failed; checking cache");
                self.cache.find(id).ok_or(e)
            }
        }
    }

    /// Creates a task.
    ///
    /// # Errors
    ///
    /// On remote failure a provisional task with a `temp_` id is cached and
    /// a `create` is queued before the error is returned.
    pub async fn create_task(&self, input: CreateTask) -> Result<Task, RemoteError> {
        match self.remote.create_task(&input).await {
            Ok(task) => {
                let mut tasks = self.cache.read_all();
                tasks.push(task.clone());
                self.cache.write_all(&tasks);
                Ok(task)
            }
            Err(e) => {
                let id = self.next_temp_id();
                tracing::warn!(task_id = %id, error = %e, "create failed; saving offline");
                let provisional = input.clone().into_task(id.clone(), Utc::now());
                let mut tasks = self.cache.read_all();
                tasks.push(provisional);
                self.cache.write_all(&tasks);
                self.queue.enqueue(id, PendingChange::Create(input));
                Err(e)
            }
        }
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// On remote failure the update is applied to the cached copy (if any)
    /// and queued before the error is returned.
    pub async fn update_task(&self, id: &str, update: UpdateTask) -> Result<Task, RemoteError> {
        match self.remote.update_task(id, &update).await {
            Ok(task) => {
                let mut tasks = self.cache.read_all();
                if let Some(slot) = tasks.iter_mut().find(|t| t.id == task.id) {
                    *slot = task.clone();
                    self.cache.write_all(&tasks);
                }
                Ok(task)
            }
            Err(e) => {
                tracing::warn!(task_id = %id, error = %e, "update failed; saving offline");
                let mut tasks = self.cache.read_all();
                if let Some(slot) = tasks.iter_mut().find(|t| t.id == id) {
                    update.apply_to(slot, Utc::now());
                    self.cache.write_all(&tasks);
                }
                self.queue.enqueue(id, PendingChange::Update(update));
                Err(e)
            }
        }
    }

    /// Deletes a task.
    ///
    /// # Errors
    ///
    /// On remote failure the task is still dropped from the cache and a
    /// `delete` is queued before the error is returned.
    pub async fn delete_task(&self, id: &str) -> Result<MessageResponse, RemoteError> {
        let result = self.remote.delete_task(id).await;
        if let Err(e) = &result {
            tracing::warn!(task_id = %id, error = %e, "delete failed; saving offline");
        }
        let mut tasks = self.cache.read_all();
        tasks.retain(|t| t.id != id);
        self.cache.write_all(&tasks);
        if result.is_err() {
            self.queue.enqueue(id, PendingChange::Delete);
        }
        result
    }

    /// Replays the queue in FIFO order, then refreshes the cache from the
    /// server if anything was queued.
    ///
    /// Entries that fail stay queued and the pass continues. A success
    /// removes every queued entry for the same task id.
    ///
    /// # Errors
    ///
    /// Returns the remote error only if the final refresh fails; the queue
    /// pass itself never errors.
    pub async fn sync(&self) -> Result<SyncReport, RemoteError> {
        let pending = self.queue.list();
        let mut report = SyncReport {
            attempted: pending.len(),
            ..SyncReport::default()
        };
        if pending.is_empty() {
            return Ok(report);
        }

        tracing::info!(count = pending.len(), "replaying pending operations");
        for op in &pending {
            match self.replay(op).await {
                Ok(()) => {
                    self.queue.remove(&op.id);
                    report.succeeded += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        task_id = %op.id,
                        kind = %op.kind(),
                        error = %e,
                        "replay failed; keeping queued"
                    );
                    report.failed += 1;
                }
            }
        }

        let tasks = self.remote.list_tasks().await.inspect_err(|e| {
            tracing::warn!(error = %e, "refresh after replay failed");
        })?;
        self.cache.write_all(&tasks);
        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            "sync finished"
        );
        Ok(report)
    }

    async fn replay(&self, op: &PendingOperation) -> Result<(), RemoteError> {
        match &op.change {
            PendingChange::Create(input) => self.remote.create_task(input).await.map(drop),
            PendingChange::Update(update) => {
                self.remote.update_task(&op.id, update).await.map(drop)
            }
            PendingChange::Delete => self.remote.delete_task(&op.id).await.map(drop),
        }
    }

    /// Millisecond-based temp id, bumped past the previous one when two
    /// offline creates land in the same millisecond.
    fn next_temp_id(&self) -> String {
        let now = now_ms();
        let prev = self
            .last_temp_ms
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or(now);
        format!("{TEMP_ID_PREFIX}{}", now.max(prev + 1))
    }
}
