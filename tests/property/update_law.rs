//! Property tests for the partial-update merge rule.
//!
//! Verifies, for arbitrary tasks and updates:
//! 1. Fields present in the update end up on the task.
//! 2. Fields absent from the update keep their prior values.
//! 3. `id` and `created_at` never change; `updated_at` becomes `now`.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use taskman_proto::task::{Task, TaskPriority, TaskStatus, UpdateTask};

fn arb_time() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_000_000_000).prop_map(|secs| Utc.timestamp_opt(secs, 0).single().unwrap())
}

fn arb_status() -> impl Strategy<Value = TaskStatus> {
    prop::sample::select(TaskStatus::ALL.to_vec())
}

fn arb_priority() -> impl Strategy<Value = TaskPriority> {
    prop::sample::select(TaskPriority::ALL.to_vec())
}

fn arb_task() -> impl Strategy<Value = Task> {
    (
        "[a-z0-9-]{1,16}",
        "[^\x00]{3,40}",
        "[^\x00]{10,80}",
        arb_status(),
        arb_priority(),
        prop::option::of(arb_time()),
        arb_time(),
    )
        .prop_map(
            |(id, title, description, status, priority, due_date, created_at)| Task {
                id,
                title,
                description,
                status,
                priority,
                due_date,
                created_at,
                updated_at: created_at,
            },
        )
}

fn arb_update() -> impl Strategy<Value = UpdateTask> {
    (
        prop::option::of("[^\x00]{3,40}"),
        prop::option::of("[^\x00]{10,80}"),
        prop::option::of(arb_status()),
        prop::option::of(arb_priority()),
        prop::option::of(arb_time()),
    )
        .prop_map(
            |(title, description, status, priority, due_date)| UpdateTask {
                title,
                description,
                status,
                priority,
                due_date,
            },
        )
}

proptest! {
    #[test]
    fn present_fields_override_absent_fields_persist(
        task in arb_task(),
        update in arb_update(),
        now in arb_time(),
    ) {
        let before = task.clone();
        let mut after = task;
        update.apply_to(&mut after, now);

        prop_assert_eq!(&after.id, &before.id);
        prop_assert_eq!(after.created_at, before.created_at);
        prop_assert_eq!(after.updated_at, now);

        prop_assert_eq!(&after.title, update.title.as_ref().unwrap_or(&before.title));
        prop_assert_eq!(
            &after.description,
            update.description.as_ref().unwrap_or(&before.description)
        );
        prop_assert_eq!(after.status, update.status.unwrap_or(before.status));
        prop_assert_eq!(after.priority, update.priority.unwrap_or(before.priority));
        prop_assert_eq!(after.due_date, update.due_date.or(before.due_date));
    }

    #[test]
    fn empty_update_only_touches_updated_at(task in arb_task(), now in arb_time()) {
        let mut after = task.clone();
        UpdateTask::default().apply_to(&mut after, now);
        let mut expected = task;
        expected.updated_at = now;
        prop_assert_eq!(after, expected);
    }
}
