//! Remote task API abstraction.
//!
//! Defines the [`RemoteApi`] trait the sync coordinator calls through.
//! Concrete implementations:
//! - [`http::HttpRemote`]: the REST server over HTTP
//! - [`memory::InMemoryRemote`]: in-process fake with a switchable
//!   online flag, for tests and demos

pub mod http;
pub mod memory;

use std::sync::Arc;

use taskman_proto::api::MessageResponse;
use taskman_proto::task::{CreateTask, Task, UpdateTask};

/// Errors from a remote call.
///
/// The coordinator does not distinguish between these: any of them means
/// "unavailable" and triggers the offline fallback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The request never produced a response (refused, timed out, DNS, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("server returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message from the error body, or the status reason.
        message: String,
    },

    /// The response body did not match the expected shape.
    #[error("invalid response body: {0}")]
    Decode(String),

    /// The configured API URL is not usable.
    #[error("invalid api url: {0}")]
    InvalidUrl(String),
}

impl RemoteError {
    /// Returns `true` if the server reported the resource as missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

/// The five task operations the server exposes.
///
/// Each call either resolves with the server's payload or fails with a
/// [`RemoteError`].
pub trait RemoteApi: Send + Sync {
    /// Fetch every task.
    fn list_tasks(&self) -> impl Future<Output = Result<Vec<Task>, RemoteError>> + Send;

    /// Fetch one task by id.
    fn get_task(&self, id: &str) -> impl Future<Output = Result<Task, RemoteError>> + Send;

    /// Create a task; the server assigns the id.
    fn create_task(
        &self,
        input: &CreateTask,
    ) -> impl Future<Output = Result<Task, RemoteError>> + Send;

    /// Apply a partial update.
    fn update_task(
        &self,
        id: &str,
        update: &UpdateTask,
    ) -> impl Future<Output = Result<Task, RemoteError>> + Send;

    /// Delete a task.
    fn delete_task(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<MessageResponse, RemoteError>> + Send;
}

/// A cheap reachability check used by the connectivity probe.
pub trait HealthCheck: Send + Sync {
    /// Returns `true` if the remote is currently reachable.
    fn is_reachable(&self) -> impl Future<Output = bool> + Send;
}

impl<T: RemoteApi> RemoteApi for Arc<T> {
    fn list_tasks(&self) -> impl Future<Output = Result<Vec<Task>, RemoteError>> + Send {
        (**self).list_tasks()
    }

    fn get_task(&self, id: &str) -> impl Future<Output = Result<Task, RemoteError>> + Send {
        (**self).get_task(id)
    }

    fn create_task(
        &self,
        input: &CreateTask,
    ) -> impl Future<Output = Result<Task, RemoteError>> + Send {
        (**self).create_task(input)
    }

    fn update_task(
        &self,
        id: &str,
        update: &UpdateTask,
    ) -> impl Future<Output = Result<Task, RemoteError>> + Send {
        (**self).update_task(id, update)
    }

    fn delete_task(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<MessageResponse, RemoteError>> + Send {
        (**self).delete_task(id)
    }
}

impl<T: HealthCheck> HealthCheck for Arc<T> {
    fn is_reachable(&self) -> impl Future<Output = bool> + Send {
        (**self).is_reachable()
    }
}
