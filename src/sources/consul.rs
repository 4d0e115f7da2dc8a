//! Minimal Consul KV client shared by the consul-backed sources.
//!
//! # Responsibilities
//! - List keys under a prefix (`GET /v1/kv/<prefix>?keys`)
//! - Read a single raw value (`GET /v1/kv/<key>?raw`)
//! - Scope every query to the configured datacenter
//!
//! # Design Decisions
//! - A missing key or prefix (HTTP 404) is not an error: `None` / empty list
//! - Transport failures and other statuses are returned to the caller
//! - Each request is bounded by `consul.timeout_secs`

use std::time::Duration;

use reqwest::{Client, StatusCode};

use crate::config::ConsulConfig;
use crate::sources::{SourceError, SourceResult};

/// Consul KV HTTP client.
#[derive(Debug, Clone)]
pub struct ConsulClient {
    http: Client,
    base_url: String,
    datacenter: Option<String>,
    source_name: &'static str,
}

impl ConsulClient {
    /// Create a client for the agent described by `config`.
    ///
    /// `source_name` is attached to every error this client returns.
    pub fn new(config: &ConsulConfig, source_name: &'static str) -> SourceResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| SourceError::InvalidConfig {
                source_name: source_name.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            datacenter: config.dc.clone(),
            source_name,
        })
    }

    /// All keys under `prefix/`. Folder keys (ending in `/`) are skipped.
    pub async fn keys(&self, prefix: &str) -> SourceResult<Vec<String>> {
        let folder = format!("{}/", prefix.trim_matches('/'));
        let response = self
            .request(&folder)
            .query(&[("keys", "")])
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(Vec::new()),
            status if status.is_success() => {
                let keys: Vec<String> = response.json().await.map_err(|e| self.unreachable(e))?;
                Ok(keys.into_iter().filter(|k| !k.ends_with('/')).collect())
            }
            status => Err(self.backend_error(&folder, status)),
        }
    }

    /// Raw value stored at `key`, if present.
    pub async fn get_raw(&self, key: &str) -> SourceResult<Option<String>> {
        let key = key.trim_matches('/');
        let response = self
            .request(key)
            .query(&[("raw", "")])
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body = response.text().await.map_err(|e| self.unreachable(e))?;
                Ok(Some(body))
            }
            status => Err(self.backend_error(key, status)),
        }
    }

    fn request(&self, key: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/v1/kv/{}", self.base_url, key);
        tracing::trace!(url = %url, dc = ?self.datacenter, "Consul KV request");
        let builder = self.http.get(url);
        match &self.datacenter {
            Some(dc) => builder.query(&[("dc", dc.as_str())]),
            None => builder,
        }
    }

    fn unreachable(&self, e: reqwest::Error) -> SourceError {
        SourceError::Unreachable {
            source_name: self.source_name.to_string(),
            reason: e.to_string(),
        }
    }

    fn backend_error(&self, key: &str, status: StatusCode) -> SourceError {
        SourceError::Backend {
            source_name: self.source_name.to_string(),
            key: key.to_string(),
            status: status.as_u16(),
        }
    }
}

/// Final path segment of a KV key.
pub fn basename(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}
