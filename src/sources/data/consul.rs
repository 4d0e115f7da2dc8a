//! Values stored in the Consul KV store.

use async_trait::async_trait;
use serde_json::Value;

use crate::aggregate::ConfigTree;
use crate::config::{ConsulConfig, ConsulValuePaths};
use crate::sources::consul::{basename, ConsulClient};
use crate::sources::{Context, DataSource, SourceResult};

/// Every key under a path becomes one string value named after the key's
/// final segment.
#[derive(Debug, Clone)]
pub struct ConsulDataSource {
    client: ConsulClient,
    paths: ConsulValuePaths,
    context: Context,
}

impl ConsulDataSource {
    pub fn new(config: &ConsulConfig, paths: ConsulValuePaths, context: Context) -> SourceResult<Self> {
        Ok(Self {
            client: ConsulClient::new(config, "consul")?,
            paths,
            context,
        })
    }

    async fn values_under(&self, path: &str) -> SourceResult<ConfigTree> {
        tracing::debug!(path = %path, "Fetching values from Consul");
        let mut values = ConfigTree::new();
        for key in self.client.keys(path).await? {
            if let Some(raw) = self.client.get_raw(&key).await? {
                values.insert(basename(&key).to_string(), Value::String(raw));
            }
        }
        Ok(values)
    }
}

#[async_trait]
impl DataSource for ConsulDataSource {
    fn name(&self) -> &str {
        "consul"
    }

    async fn global_values(&self) -> SourceResult<ConfigTree> {
        let path = self.context.interpolate(&self.paths.global);
        self.values_under(&path).await
    }

    async fn values_for_template(&self, template: &str) -> SourceResult<ConfigTree> {
        let path = self
            .context
            .interpolate_for_template(&self.paths.template, template);
        self.values_under(&path).await
    }
}
