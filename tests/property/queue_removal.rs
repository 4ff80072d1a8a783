//! Property tests for the pending-operation queue.
//!
//! Verifies, for arbitrary enqueue sequences:
//! 1. `list` returns entries in enqueue order.
//! 2. `remove(id)` drops every entry for `id` and keeps the rest in order.
//! 3. The queue survives a reload from the same storage.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use proptest::prelude::*;
use taskman::queue::PendingQueue;
use taskman::storage::MemoryStorage;
use taskman_proto::pending::PendingChange;
use taskman_proto::task::{CreateTask, TaskStatus, UpdateTask};

fn arb_id() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "temp_1".to_string(),
        "temp_2".to_string(),
        "task-1".to_string(),
        "task-2".to_string(),
        "task-3".to_string(),
    ])
}

fn arb_change() -> impl Strategy<Value = PendingChange> {
    prop_oneof![
        "[a-z ]{3,20}".prop_map(|title| PendingChange::Create(CreateTask::new(
            title,
            "Queued by a property test"
        ))),
        prop::sample::select(TaskStatus::ALL.to_vec()).prop_map(|status| {
            PendingChange::Update(UpdateTask {
                status: Some(status),
                ..UpdateTask::default()
            })
        }),
        Just(PendingChange::Delete),
    ]
}

fn arb_ops() -> impl Strategy<Value = Vec<(String, PendingChange)>> {
    prop::collection::vec((arb_id(), arb_change()), 0..12)
}

fn fill(ops: &[(String, PendingChange)]) -> (Arc<MemoryStorage>, PendingQueue<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let queue = PendingQueue::new(Arc::clone(&storage));
    for (id, change) in ops {
        queue.enqueue(id.clone(), change.clone());
    }
    (storage, queue)
}

proptest! {
    #[test]
    fn list_preserves_enqueue_order(ops in arb_ops()) {
        let (_, queue) = fill(&ops);
        let listed: Vec<(String, PendingChange)> = queue
            .list()
            .into_iter()
            .map(|op| (op.id, op.change))
            .collect();
        prop_assert_eq!(listed, ops);
    }

    #[test]
    fn remove_drops_all_entries_for_id_and_keeps_the_rest(
        ops in arb_ops(),
        target in arb_id(),
    ) {
        let (_, queue) = fill(&ops);
        queue.remove(&target);

        let remaining: Vec<(String, PendingChange)> = queue
            .list()
            .into_iter()
            .map(|op| (op.id, op.change))
            .collect();
        let expected: Vec<(String, PendingChange)> = ops
            .into_iter()
            .filter(|(id, _)| *id != target)
            .collect();
        prop_assert_eq!(remaining, expected);
    }

    #[test]
    fn reload_sees_the_same_queue(ops in arb_ops()) {
        let (storage, queue) = fill(&ops);
        let reloaded = PendingQueue::new(storage);
        prop_assert_eq!(reloaded.list(), queue.list());
    }
}

#[test]
fn update_then_delete_for_temp_id_are_removed_together() {
    let (_, queue) = fill(&[
        (
            "temp_1".to_string(),
            PendingChange::Update(UpdateTask {
                status: Some(TaskStatus::Completed),
                ..UpdateTask::default()
            }),
        ),
        ("temp_1".to_string(), PendingChange::Delete),
    ]);
    assert_eq!(queue.len(), 2);

    queue.remove("temp_1");
    assert!(queue.list().is_empty());
}
