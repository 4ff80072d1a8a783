//! Pending-operation records for the client's offline write queue.
//!
//! A [`PendingOperation`] is a mutation that the server has not confirmed.
//! It is stored as JSON in the client's persistent storage:
//!
//! ```json
//! {"id":"temp_1700000000000","type":"create","data":{"title":"..."},"timestamp":1700000000000}
//! {"id":"task-3","type":"delete","timestamp":1700000000500}
//! ```

use serde::{Deserialize, Serialize};

use crate::task::{CreateTask, UpdateTask};

/// The bare kind of a pending operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Create a task.
    Create,
    /// Update a task.
    Update,
    /// Delete a task.
    Delete,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// A queued mutation together with its payload.
///
/// Delete carries no payload and serializes without a `data` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum PendingChange {
    /// The original create input.
    Create(CreateTask),
    /// The original partial update.
    Update(UpdateTask),
    /// A delete.
    Delete,
}

impl PendingChange {
    /// Returns the kind of this change.
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        match self {
            Self::Create(_) => OperationKind::Create,
            Self::Update(_) => OperationKind::Update,
            Self::Delete => OperationKind::Delete,
        }
    }
}

/// A mutation waiting to be replayed against the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOperation {
    /// Identifier of the target task (may be a temporary `temp_*` id).
    pub id: String,
    /// What to replay.
    #[serde(flatten)]
    pub change: PendingChange,
    /// Milliseconds since epoch when the operation was queued.
    pub timestamp: u64,
}

impl PendingOperation {
    /// Returns the kind of the queued change.
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        self.change.kind()
    }
}
