//! In-process [`RemoteApi`] fake.
//!
//! Behaves like the REST server (sequential `task-{n}` ids, 404 on unknown
//! ids) but lives in memory and can be switched offline or told to fail
//! specific requests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use indexmap::IndexMap;
use parking_lot::Mutex;
use taskman_proto::api::MessageResponse;
use taskman_proto::task::{CreateTask, Task, UpdateTask};

use super::{HealthCheck, RemoteApi, RemoteError};

#[derive(Default)]
struct State {
    tasks: IndexMap<String, Task>,
    next_id: u64,
    failing: HashSet<String>,
}

/// A fake task server held in memory.
pub struct InMemoryRemote {
    state: Mutex<State>,
    online: AtomicBool,
}

impl Default for InMemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRemote {
    /// Creates an empty, online remote.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 1,
                ..State::default()
            }),
            online: AtomicBool::new(true),
        }
    }

    /// Switches the remote on or off. While offline every call fails with
    /// [`RemoteError::Transport`].
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Returns the current online flag.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Makes requests targeting `key` fail with a 500.
    ///
    /// `key` matches a task id for get/update/delete and a title for create.
    pub fn fail_for(&self, key: impl Into<String>) {
        self.state.lock().failing.insert(key.into());
    }

    /// Removes all injected failures.
    pub fn clear_failures(&self) {
        self.state.lock().failing.clear();
    }

    /// Snapshot of the server-side task list in creation order.
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.state.lock().tasks.values().cloned().collect()
    }

    /// Inserts a task directly, bypassing id assignment.
    pub fn seed(&self, task: Task) {
        self.state.lock().tasks.insert(task.id.clone(), task);
    }

    fn check(&self, state: &State, key: &str) -> Result<(), RemoteError> {
        if !self.is_online() {
            return Err(RemoteError::Transport("connection refused".to_string()));
        }
        if state.failing.contains(key) {
            return Err(RemoteError::Status {
                status: 500,
                message: "Internal server error".to_string(),
            });
        }
        Ok(())
    }
}

fn not_found() -> RemoteError {
    RemoteError::Status {
        status: 404,
        message: "Task not found".to_string(),
    }
}

impl RemoteApi for InMemoryRemote {
    async fn list_tasks(&self) -> Result<Vec<Task>, RemoteError> {
        let state = self.state.lock();
        self.check(&state, "")?;
        Ok(state.tasks.values().cloned().collect())
    }

    async fn get_task(&self, id: &str) -> Result<Task, RemoteError> {
        let state = self.state.lock();
        self.check(&state, id)?;
        state.tasks.get(id).cloned().ok_or_else(not_found)
    }

    async fn create_task(&self, input: &CreateTask) -> Result<Task, RemoteError> {
        let mut state = self.state.lock();
        self.check(&state, &input.title)?;
        let id = format!("task-{}", state.next_id);
        state.next_id += 1;
        let task = input.clone().into_task(id.clone(), Utc::now());
        state.tasks.insert(id, task.clone());
        Ok(task)
    }

    async fn update_task(&self, id: &str, update: &UpdateTask) -> Result<Task, RemoteError> {
        let mut state = self.state.lock();
        self.check(&state, id)?;
        let task = state.tasks.get_mut(id).ok_or_else(not_found)?;
        update.apply_to(task, Utc::now());
        Ok(task.clone())
    }

    async fn delete_task(&self, id: &str) -> Result<MessageResponse, RemoteError> {
        let mut state = self.state.lock();
        self.check(&state, id)?;
        state.tasks.shift_remove(id).ok_or_else(not_found)?;
        Ok(MessageResponse {
            message: "Task deleted successfully".to_string(),
        })
    }
}

impl HealthCheck for InMemoryRemote {
    async fn is_reachable(&self) -> bool {
        self.is_online()
    }
}
