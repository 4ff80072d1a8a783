// Test-specific lint overrides: integration tests use unwrap/expect freely,
// and some pedantic/nursery lints are not appropriate for test code.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::doc_markdown
)]

//! End-to-end offline write and replay against the real REST server.
//!
//! Writes are first made through an [`HttpRemote`] pointing at a closed
//! port, so every call fails and lands in the queue. A second coordinator
//! sharing the same storage then points at a live server and syncs, the way
//! a restarted client picks up where the last one left off.

use std::sync::Arc;
use std::time::Duration;

use taskman::remote::RemoteError;
use taskman::remote::http::HttpRemote;
use taskman::storage::{FileStorage, MemoryStorage, Storage};
use taskman::sync::{SyncCoordinator, SyncReport, TEMP_ID_PREFIX};
use taskman_proto::pending::OperationKind;
use taskman_proto::task::{CreateTask, TaskPriority, TaskStatus, UpdateTask};
use taskman_server::api;

const TIMEOUT: Duration = Duration::from_secs(2);

/// A URL nobody is listening on.
fn dead_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

async fn live_url() -> String {
    let (addr, _handle) = api::start_server("127.0.0.1:0").await.unwrap();
    format!("http://{addr}")
}

fn coordinator<S: Storage>(url: &str, storage: &Arc<S>) -> SyncCoordinator<HttpRemote, S> {
    SyncCoordinator::new(HttpRemote::new(url, TIMEOUT).unwrap(), Arc::clone(storage))
}

fn input(title: &str) -> CreateTask {
    CreateTask::new(title, "Created by the offline sync test")
}

#[tokio::test]
async fn offline_writes_replay_against_live_server() {
    let storage = Arc::new(MemoryStorage::new());

    let offline = coordinator(&dead_url(), &storage);
    let err = offline.create_task(input("Buy groceries")).await.unwrap_err();
    assert!(matches!(err, RemoteError::Transport(_)));
    let err = offline
        .create_task(CreateTask {
            priority: Some(TaskPriority::High),
            ..input("Call the bank")
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Transport(_)));

    let cached = offline.list_tasks().await;
    assert_eq!(cached.len(), 2);
    assert!(cached.iter().all(|t| t.id.starts_with(TEMP_ID_PREFIX)));
    let kinds: Vec<OperationKind> = offline.queue().list().iter().map(|op| op.kind()).collect();
    assert_eq!(kinds, vec![OperationKind::Create, OperationKind::Create]);

    let online = coordinator(&live_url().await, &storage);
    let report = online.sync().await.unwrap();
    assert_eq!(
        report,
        SyncReport {
            attempted: 2,
            succeeded: 2,
            failed: 0
        }
    );
    assert!(online.queue().is_empty());

    let cached = online.cache().read_all();
    let titles: Vec<&str> = cached.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Buy groceries", "Call the bank"]);
    assert_eq!(cached[0].id, "task-1");
    assert_eq!(cached[1].priority, TaskPriority::High);
    assert_eq!(online.list_tasks().await, cached);
    assert!(online.cache().last_sync_time().is_some());
}

#[tokio::test]
async fn rejected_replay_stays_queued() {
    let storage = Arc::new(MemoryStorage::new());
    let url = live_url().await;

    let online = coordinator(&url, &storage);
    let kept = online.create_task(input("Keep me")).await.unwrap();
    let gone = online.create_task(input("Remove me")).await.unwrap();

    let offline = coordinator(&dead_url(), &storage);
    // The server will reject this one: title is below the minimum length.
    let _ = offline
        .update_task(
            &kept.id,
            UpdateTask {
                title: Some("x".to_string()),
                ..UpdateTask::default()
            },
        )
        .await;
    let _ = offline.delete_task(&gone.id).await;
    assert_eq!(offline.cache().find(&kept.id).unwrap().title, "x");
    assert!(offline.cache().find(&gone.id).is_none());
    let queued = offline.queue().list();
    assert_eq!(queued.len(), 2);

    let report = online.sync().await.unwrap();
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(online.queue().list(), vec![queued[0].clone()]);

    // The refresh restores the server's view of the rejected edit.
    assert_eq!(online.cache().find(&kept.id).unwrap().title, "Keep me");
    assert_eq!(online.cache().read_all().len(), 1);
}

#[tokio::test]
async fn queued_status_change_survives_restart_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let url = live_url().await;

    let created = {
        let storage = Arc::new(FileStorage::new(dir.path()));
        coordinator(&url, &storage)
            .create_task(input("Persisted task"))
            .await
            .unwrap()
    };

    {
        let storage = Arc::new(FileStorage::new(dir.path()));
        let offline = coordinator(&dead_url(), &storage);
        let update = UpdateTask {
            status: Some(TaskStatus::Completed),
            ..UpdateTask::default()
        };
        assert!(offline.update_task(&created.id, update).await.is_err());
    }

    let storage = Arc::new(FileStorage::new(dir.path()));
    let online = coordinator(&url, &storage);
    assert_eq!(online.queue().len(), 1);
    assert_eq!(
        online.cache().find(&created.id).unwrap().status,
        TaskStatus::Completed
    );

    online.sync().await.unwrap();
    assert!(online.queue().is_empty());
    let remote = online.get_task(&created.id).await.unwrap();
    assert_eq!(remote.status, TaskStatus::Completed);
}

#[tokio::test]
async fn get_falls_back_to_cache_when_server_is_down() {
    let storage = Arc::new(MemoryStorage::new());
    let online = coordinator(&live_url().await, &storage);
    let created = online.create_task(input("Readable offline")).await.unwrap();

    let offline = coordinator(&dead_url(), &storage);
    assert_eq!(offline.get_task(&created.id).await.unwrap(), created);
    assert!(matches!(
        offline.get_task("task-404").await,
        Err(RemoteError::Transport(_))
    ));
}
