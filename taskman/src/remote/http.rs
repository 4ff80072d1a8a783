//! HTTP implementation of [`RemoteApi`] against the Taskman REST server.

use std::time::Duration;

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use taskman_proto::api::{DataResponse, ErrorResponse, HealthResponse, MessageResponse};
use taskman_proto::task::{CreateTask, Task, UpdateTask};
use url::Url;

use super::{HealthCheck, RemoteApi, RemoteError};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// REST client for the task API.
#[derive(Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    base: Url,
}

impl HttpRemote {
    /// Creates a client for the API rooted at `api_url`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::InvalidUrl`] if the URL cannot be parsed or
    /// cannot carry a path, and [`RemoteError::Transport`] if the HTTP client
    /// cannot be built.
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let mut base = Url::parse(api_url).map_err(|e| RemoteError::InvalidUrl(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(RemoteError::InvalidUrl(format!(
                "{api_url} cannot be used as a base url"
            )));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        Ok(Self { client, base })
    }

    /// The normalized base URL (always ends in `/`).
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    /// Calls `GET /health`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] if the server is unreachable or unhealthy.
    pub async fn ping(&self) -> Result<HealthResponse, RemoteError> {
        let request = self.request(Method::GET, &["health"])?;
        Self::send(request).await
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| RemoteError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, RemoteError> {
        Ok(self.client.request(method, self.endpoint(segments)?))
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, RemoteError> {
        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let fallback = status.canonical_reason().unwrap_or("request failed").to_string();
            let message = response
                .json::<ErrorResponse>()
                .await
                .map_or(fallback, |body| body.error.message);
            return Err(RemoteError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }

    async fn send_data<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, RemoteError> {
        Self::send::<DataResponse<T>>(request).await.map(|r| r.data)
    }
}

impl RemoteApi for HttpRemote {
    async fn list_tasks(&self) -> Result<Vec<Task>, RemoteError> {
        let request = self.request(Method::GET, &["tasks"])?;
        Self::send_data(request).await
    }

    async fn get_task(&self, id: &str) -> Result<Task, RemoteError> {
        let request = self.request(Method::GET, &["tasks", id])?;
        Self::send_data(request).await
    }

    async fn create_task(&self, input: &CreateTask) -> Result<Task, RemoteError> {
        let request = self.request(Method::POST, &["tasks"])?.json(input);
        Self::send_data(request).await
    }

    async fn update_task(&self, id: &str, update: &UpdateTask) -> Result<Task, RemoteError> {
        let request = self.request(Method::PUT, &["tasks", id])?.json(update);
        Self::send_data(request).await
    }

    async fn delete_task(&self, id: &str) -> Result<MessageResponse, RemoteError> {
        let request = self.request(Method::DELETE, &["tasks", id])?;
        Self::send(request).await
    }
}

impl HealthCheck for HttpRemote {
    async fn is_reachable(&self) -> bool {
        self.ping().await.is_ok()
    }
}
