// Test-specific lint overrides: integration tests use unwrap/expect freely,
// and some pedantic/nursery lints are not appropriate for test code.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::doc_markdown
)]

//! Integration tests for the task REST API.
//!
//! Each test starts a real server on an ephemeral port and talks to it with
//! `reqwest`, checking status codes and JSON envelopes.

use std::sync::Arc;

use axum::http::HeaderValue;
use serde_json::{Value, json};
use taskman_server::api::{self, ServerState};
use taskman_server::config::{CorsOrigins, ServerConfig};
use taskman_server::error::COMPLETED_TASK_MESSAGE;
use taskman_server::store::TaskStore;

async fn start() -> String {
    let (addr, _handle) = api::start_server("127.0.0.1:0").await.unwrap();
    format!("http://{addr}")
}

async fn create(client: &reqwest::Client, base: &str, body: Value) -> reqwest::Response {
    client
        .post(format!("{base}/tasks"))
        .json(&body)
        .send()
        .await
        .unwrap()
}

async fn create_ok(client: &reqwest::Client, base: &str, title: &str) -> Value {
    let response = create(
        client,
        base,
        json!({ "title": title, "description": "A perfectly valid description" }),
    )
    .await;
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    body["data"].clone()
}

#[tokio::test]
async fn health_reports_ok() {
    let base = start().await;
    let body: Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn create_applies_defaults_and_sequential_ids() {
    let base = start().await;
    let client = reqwest::Client::new();

    let first = create_ok(&client, &base, "First task").await;
    let second = create_ok(&client, &base, "Second task").await;

    assert_eq!(first["id"], "task-1");
    assert_eq!(second["id"], "task-2");
    assert_eq!(first["status"], "TODO");
    assert_eq!(first["priority"], "MEDIUM");
    assert_eq!(first["createdAt"], first["updatedAt"]);
    assert!(first.get("dueDate").is_none());
}

#[tokio::test]
async fn create_sanitizes_text() {
    let base = start().await;
    let client = reqwest::Client::new();

    let response = create(
        &client,
        &base,
        json!({
            "title": "  <b>Bold move</b>  ",
            "description": "<script>alert(1)</script> please",
        }),
    )
    .await;
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["title"], "bBold move/b");
    assert_eq!(body["data"]["description"], "scriptalert(1)/script please");
}

#[tokio::test]
async fn create_rejects_invalid_fields_with_details() {
    let base = start().await;
    let client = reqwest::Client::new();

    let response = create(
        &client,
        &base,
        json!({
            "title": "ab",
            "description": "   ",
            "dueDate": "2000-01-01T00:00:00Z",
        }),
    )
    .await;
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["message"], "Validation failed");
    assert_eq!(body["error"]["statusCode"], 400);
    let fields: Vec<&str> = body["error"]["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["title", "description", "dueDate"]);
}

#[tokio::test]
async fn create_rejects_unknown_status() {
    let base = start().await;
    let client = reqwest::Client::new();

    let response = create(
        &client,
        &base,
        json!({
            "title": "Bad status",
            "description": "Status is not one of the three",
            "status": "DONE",
        }),
    )
    .await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["message"], "Validation failed");
}

#[tokio::test]
async fn get_update_delete_round() {
    let base = start().await;
    let client = reqwest::Client::new();
    let task = create_ok(&client, &base, "Round trip").await;
    let id = task["id"].as_str().unwrap();

    let fetched: Value = client
        .get(format!("{base}/tasks/{id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["data"], task);

    let updated: Value = client
        .put(format!("{base}/tasks/{id}"))
        .json(&json!({ "priority": "HIGH" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["data"]["priority"], "HIGH");
    assert_eq!(updated["data"]["title"], "Round trip");
    assert_eq!(updated["data"]["createdAt"], task["createdAt"]);

    let deleted = client
        .delete(format!("{base}/tasks/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), 200);
    let body: Value = deleted.json().await.unwrap();
    assert_eq!(body["message"], "Task deleted successfully");

    let list: Value = reqwest::get(format!("{base}/tasks"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list["data"], json!([]));
}

#[tokio::test]
async fn unknown_id_is_404() {
    let base = start().await;
    let client = reqwest::Client::new();

    for response in [
        client.get(format!("{base}/tasks/task-9")).send().await.unwrap(),
        client
            .put(format!("{base}/tasks/task-9"))
            .json(&json!({ "title": "Anything" }))
            .send()
            .await
            .unwrap(),
        client
            .delete(format!("{base}/tasks/task-9"))
            .send()
            .await
            .unwrap(),
    ] {
        assert_eq!(response.status(), 404);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"]["message"], "Task not found");
        assert_eq!(body["error"]["statusCode"], 404);
    }
}

#[tokio::test]
async fn completed_task_is_locked_until_reopened() {
    let base = start().await;
    let client = reqwest::Client::new();
    let task = create_ok(&client, &base, "Finish me").await;
    let url = format!("{base}/tasks/{}", task["id"].as_str().unwrap());

    let done = client
        .put(&url)
        .json(&json!({ "status": "COMPLETED" }))
        .send()
        .await
        .unwrap();
    assert_eq!(done.status(), 200);

    let locked = client
        .put(&url)
        .json(&json!({ "title": "Renamed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(locked.status(), 400);
    let body: Value = locked.json().await.unwrap();
    assert_eq!(body["error"]["message"], COMPLETED_TASK_MESSAGE);

    let reopened: Value = client
        .put(&url)
        .json(&json!({ "status": "IN_PROGRESS", "title": "Renamed" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reopened["data"]["status"], "IN_PROGRESS");
    assert_eq!(reopened["data"]["title"], "Renamed");
}

#[tokio::test]
async fn cors_preflight_is_answered() {
    let base = start().await;
    let client = reqwest::Client::new();

    let response = client
        .request(reqwest::Method::OPTIONS, format!("{base}/tasks"))
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn calendar_date_due_date_is_accepted() {
    let base = start().await;
    let client = reqwest::Client::new();

    let response = create(
        &client,
        &base,
        json!({
            "title": "Date picker task",
            "description": "Due date comes from a date input",
            "dueDate": "2099-12-31",
        }),
    )
    .await;
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    let id = body["data"]["id"].as_str().unwrap();
    assert_eq!(body["data"]["dueDate"], "2099-12-31T00:00:00Z");

    let updated = client
        .put(format!("{base}/tasks/{id}"))
        .json(&json!({ "dueDate": "2100-01-15" }))
        .send()
        .await
        .unwrap();
    assert_eq!(updated.status(), 200);
    let body: Value = updated.json().await.unwrap();
    assert_eq!(body["data"]["dueDate"], "2100-01-15T00:00:00Z");
}

async fn start_with(config: &ServerConfig) -> String {
    let state = Arc::new(ServerState::from_config(config, TaskStore::new()));
    let (addr, _handle) = api::start_server_with_state("127.0.0.1:0", state)
        .await
        .unwrap();
    format!("http://{addr}")
}

async fn preflight(client: &reqwest::Client, base: &str, origin: &str) -> reqwest::Response {
    client
        .request(reqwest::Method::OPTIONS, format!("{base}/tasks"))
        .header("Origin", origin)
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn configured_origins_restrict_cors() {
    let config = ServerConfig {
        cors: CorsOrigins::List(vec![HeaderValue::from_static("http://localhost:5173")]),
        ..ServerConfig::default()
    };
    let base = start_with(&config).await;
    let client = reqwest::Client::new();

    let allowed = preflight(&client, &base, "http://localhost:5173").await;
    assert_eq!(
        allowed.headers().get("access-control-allow-origin").unwrap(),
        "http://localhost:5173"
    );

    let other = preflight(&client, &base, "http://evil.test").await;
    assert!(other.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn configured_body_limit_rejects_large_payloads() {
    let config = ServerConfig {
        max_body_size: 512,
        ..ServerConfig::default()
    };
    let base = start_with(&config).await;
    let client = reqwest::Client::new();

    // Valid by the field rules, but larger than the configured limit.
    let response = create(
        &client,
        &base,
        json!({ "title": "Too big", "description": "x".repeat(900) }),
    )
    .await;
    assert_eq!(response.status(), 400);
    let list: Value = reqwest::get(format!("{base}/tasks"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list["data"], json!([]));

    let small = create_ok(&client, &base, "Fits fine").await;
    assert_eq!(small["id"], "task-1");
}
