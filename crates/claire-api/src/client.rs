//! HTTP client for the assistant service

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::{
    error::{Error, Result},
    types::{ChatRequest, ChatResponse, HealthResponse},
};

/// Default address of a locally running service
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

const HEALTH_PATH: &str = "/api/v1/health";
const CHAT_PATH: &str = "/api/v1/chat/chat";

/// Connection settings for [`HttpServiceApi`]
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base address, without a trailing `/api/...` path
    pub base_url: String,
    /// Per-request timeout. `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: None,
        }
    }
}

impl ApiConfig {
    /// Create a config for the given base address
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set a request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

/// The two exchanges the widget has with the assistant service
#[async_trait]
pub trait ServiceApi: Send + Sync {
    /// Probe `GET /api/v1/health`
    async fn health(&self) -> Result<HealthResponse>;

    /// Send one question to `POST /api/v1/chat/chat`
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse>;
}

/// reqwest-backed [`ServiceApi`]
#[derive(Debug, Clone)]
pub struct HttpServiceApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpServiceApi {
    /// Build a client from config
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(Error::InvalidConfig(format!(
                "base URL must start with http:// or https://, got '{}'",
                config.base_url
            )));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { client, base_url })
    }

    /// The normalized base address
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Turn a response into `T`, mapping non-2xx codes to [`Error::Status`].
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::status(status.as_u16(), body));
    }

    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl ServiceApi for HttpServiceApi {
    async fn health(&self) -> Result<HealthResponse> {
        let response = self.client.get(self.url(HEALTH_PATH)).send().await?;
        decode(response).await
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        tracing::debug!(session_id = %request.session_id, "POST {}", CHAT_PATH);
        let response = self
            .client
            .post(self.url(CHAT_PATH))
            .json(request)
            .send()
            .await?;
        decode(response).await
    }
}
