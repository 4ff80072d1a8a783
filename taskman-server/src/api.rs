//! REST API: shared state, routes, handlers, and request logging.
//!
//! ```text
//! GET    /health        liveness probe
//! GET    /tasks         list all tasks
//! GET    /tasks/{id}    fetch one task
//! POST   /tasks         create (201)
//! PUT    /tasks/{id}    partial update
//! DELETE /tasks/{id}    delete
//! ```

use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Path, Request, State};
use axum::http::{Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use taskman_proto::api::{DataResponse, HealthResponse, MessageResponse};
use taskman_proto::task::{CreateTask, Task, TaskStatus, UpdateTask};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::{CorsOrigins, ServerConfig};
use crate::error::ApiError;
use crate::store::TaskStore;
use crate::validate::{validate_create, validate_update};

/// Shared server state.
pub struct ServerState {
    /// The in-memory task store.
    pub store: TaskStore,
    /// Maximum accepted request body in bytes.
    max_body_size: usize,
    /// Origins answered in CORS responses.
    cors: CorsOrigins,
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerState {
    /// Creates state with an empty store and default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(&ServerConfig::default(), TaskStore::new())
    }

    /// Creates state from resolved settings and a pre-built store.
    #[must_use]
    pub fn from_config(config: &ServerConfig, store: TaskStore) -> Self {
        Self {
            store,
            max_body_size: config.max_body_size,
            cors: config.cors.clone(),
        }
    }
}

type SharedState = State<Arc<ServerState>>;

/// Builds the axum router with CORS, body limit and request logging.
pub fn router(state: Arc<ServerState>) -> Router {
    let allow_origin = match &state.cors {
        CorsOrigins::Any => AllowOrigin::any(),
        CorsOrigins::List(origins) => AllowOrigin::list(origins.iter().cloned()),
    };
    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN]);

    Router::new()
        .route("/health", get(health))
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .layer(DefaultBodyLimit::max(state.max_body_size))
        .layer(cors)
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// Logs `[METHOD] /path - Execution time: Xms` for every request.
async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    tracing::info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms,
        "[{method}] {path} - Execution time: {elapsed_ms}ms"
    );
    response
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
    })
}

async fn list_tasks(State(state): SharedState) -> Json<DataResponse<Vec<Task>>> {
    Json(DataResponse::new(state.store.find_all().await))
}

async fn get_task(
    State(state): SharedState,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<Task>>, ApiError> {
    let task = state.store.find_by_id(&id).await.ok_or(ApiError::NotFound)?;
    Ok(Json(DataResponse::new(task)))
}

async fn create_task(
    State(state): SharedState,
    payload: Result<Json<CreateTask>, JsonRejection>,
) -> Result<(StatusCode, Json<DataResponse<Task>>), ApiError> {
    let Json(input) = payload?;
    let input = validate_create(input, Utc::now()).map_err(ApiError::Validation)?;
    let task = state.store.create(input).await;
    tracing::debug!(task_id = %task.id, "task created");
    Ok((StatusCode::CREATED, Json(DataResponse::new(task))))
}

async fn update_task(
    State(state): SharedState,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTask>, JsonRejection>,
) -> Result<Json<DataResponse<Task>>, ApiError> {
    let Json(update) = payload?;
    let update = validate_update(update, Utc::now()).map_err(ApiError::Validation)?;

    let existing = state.store.find_by_id(&id).await.ok_or(ApiError::NotFound)?;
    ensure_editable(&existing, &update)?;

    let task = state
        .store
        .update(&id, &update)
        .await
        .ok_or(ApiError::NotFound)?;
    tracing::debug!(task_id = %task.id, "task updated");
    Ok(Json(DataResponse::new(task)))
}

async fn delete_task(
    State(state): SharedState,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    if state.store.find_by_id(&id).await.is_none() {
        return Err(ApiError::NotFound);
    }
    if !state.store.delete(&id).await {
        return Err(ApiError::Internal("Failed to delete task".to_string()));
    }
    tracing::debug!(task_id = %id, "task deleted");
    Ok(Json(MessageResponse {
        message: "Task deleted successfully".to_string(),
    }))
}

/// A completed task may only be touched by an update that reopens it.
fn ensure_editable(existing: &Task, update: &UpdateTask) -> Result<(), ApiError> {
    match (existing.status, update.status) {
        (TaskStatus::Completed, None | Some(TaskStatus::Completed)) => {
            Err(ApiError::CompletedTaskLocked)
        }
        _ => Ok(()),
    }
}

/// Starts the API server on the given address with default state.
///
/// Returns the bound address (useful when binding port 0) and the serve task.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    start_server_with_state(addr, Arc::new(ServerState::new())).await
}

/// Starts the API server with a pre-configured [`ServerState`].
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server_with_state(
    addr: &str,
    state: Arc<ServerState>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "api server error");
        }
    });

    Ok((bound_addr, handle))
}
