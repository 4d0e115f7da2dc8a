//! Async client for the stencil status API.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default API version used in request paths.
pub const DEFAULT_API_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ping {
    pub ping: String,
}

/// The full resolved configuration as served by `/v<N>/config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedConfig {
    pub global: Map<String, Value>,
    pub per_template: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    pub content: String,
}

pub struct StencilClient {
    client: Client,
    base_url: String,
    api_version: u32,
}

impl StencilClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_version: DEFAULT_API_VERSION,
        }
    }

    /// Use `v<version>` in request paths.
    pub fn with_api_version(mut self, version: u32) -> Self {
        self.api_version = version;
        self
    }

    pub async fn ping(&self) -> Result<Ping, ClientError> {
        self.get("/ping".to_string()).await
    }

    pub async fn config(&self) -> Result<ResolvedConfig, ClientError> {
        self.get(self.versioned("config")).await
    }

    pub async fn globals(&self) -> Result<Map<String, Value>, ClientError> {
        self.get(self.versioned("globals")).await
    }

    pub async fn templates(&self) -> Result<Vec<String>, ClientError> {
        self.get(self.versioned("templates")).await
    }

    /// Fetch one template body; `None` when no source holds it.
    pub async fn template(&self, name: &str) -> Result<Option<Template>, ClientError> {
        match self.get(self.versioned(&format!("template/{}", name))).await {
            Ok(template) => Ok(Some(template)),
            Err(ClientError::Status { status, .. }) if status == StatusCode::NOT_FOUND => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn versioned(&self, endpoint: &str) -> String {
        format!("/v{}/{}", self.api_version, endpoint)
    }

    async fn get<T: DeserializeOwned>(&self, path: String) -> Result<T, ClientError> {
        let resp = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(ClientError::Status { status, body: text });
        }

        Ok(serde_json::from_str(&text)?)
    }
}
