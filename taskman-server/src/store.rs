//! In-memory task storage for the REST API.
//!
//! The [`TaskStore`] keeps tasks in insertion order and assigns sequential
//! `task-<n>` identifiers. Nothing is persisted; a restart starts empty.

use chrono::Utc;
use indexmap::IndexMap;
use taskman_proto::task::{CreateTask, Task, UpdateTask};
use tokio::sync::RwLock;

/// Tasks plus the id counter, guarded together so id assignment and insert
/// are atomic.
#[derive(Debug)]
struct Inner {
    tasks: IndexMap<String, Task>,
    next_id: u64,
}

impl Inner {
    fn new() -> Self {
        Self {
            tasks: IndexMap::new(),
            next_id: 1,
        }
    }
}

/// Thread-safe map-backed task store.
pub struct TaskStore {
    inner: RwLock<Inner>,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    /// Creates an empty store whose first id will be `task-1`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::new()),
        }
    }

    /// Creates a task from validated input and returns it.
    pub async fn create(&self, input: CreateTask) -> Task {
        let mut inner = self.inner.write().await;
        let id = format!("task-{}", inner.next_id);
        inner.next_id += 1;
        let task = input.into_task(id.clone(), Utc::now());
        inner.tasks.insert(id, task.clone());
        drop(inner);
        task
    }

    /// Returns every task in insertion order.
    pub async fn find_all(&self) -> Vec<Task> {
        self.inner.read().await.tasks.values().cloned().collect()
    }

    /// Looks up a task by id.
    pub async fn find_by_id(&self, id: &str) -> Option<Task> {
        self.inner.read().await.tasks.get(id).cloned()
    }

    /// Applies a partial update, returning the new version, or `None` if the
    /// id is unknown.
    pub async fn update(&self, id: &str, update: &UpdateTask) -> Option<Task> {
        let mut inner = self.inner.write().await;
        let task = inner.tasks.get_mut(id)?;
        update.apply_to(task, Utc::now());
        Some(task.clone())
    }

    /// Removes a task. Returns `true` if it existed.
    pub async fn delete(&self, id: &str) -> bool {
        self.inner.write().await.tasks.shift_remove(id).is_some()
    }

    /// Drops every task and resets the id counter.
    pub async fn clear(&self) {
        *self.inner.write().await = Inner::new();
    }

    /// Number of stored tasks.
    pub async fn len(&self) -> usize {
        self.inner.read().await.tasks.len()
    }

    /// Returns `true` if the store holds no tasks.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
