//! Templates stored under a Consul KV namespace.

use async_trait::async_trait;

use crate::config::ConsulConfig;
use crate::sources::consul::{basename, ConsulClient};
use crate::sources::template::is_plain_name;
use crate::sources::{Context, SourceResult, TemplateSource};

/// Each key under the interpolated namespace is one template, named after
/// the key's final segment.
#[derive(Debug, Clone)]
pub struct ConsulTemplateSource {
    client: ConsulClient,
    namespace: String,
    context: Context,
}

impl ConsulTemplateSource {
    pub fn new(config: &ConsulConfig, namespace: String, context: Context) -> SourceResult<Self> {
        Ok(Self {
            client: ConsulClient::new(config, "consul")?,
            namespace,
            context,
        })
    }

    fn path(&self) -> String {
        self.context
            .interpolate(&self.namespace)
            .trim_matches('/')
            .to_string()
    }
}

#[async_trait]
impl TemplateSource for ConsulTemplateSource {
    fn name(&self) -> &str {
        "consul"
    }

    async fn list_templates(&self) -> SourceResult<Vec<String>> {
        let path = self.path();
        tracing::debug!(path = %path, "Fetching templates from Consul");
        let keys = self.client.keys(&path).await?;
        Ok(keys.iter().map(|k| basename(k).to_string()).collect())
    }

    async fn fetch_template(&self, template: &str) -> SourceResult<Option<String>> {
        if !is_plain_key(template) {
            tracing::debug!(template = %template, "Refusing non-plain template key");
            return Ok(None);
        }
        self.client
            .get_raw(&format!("{}/{}", self.path(), template))
            .await
    }
}

/// One key segment the KV URL cannot reinterpret as an escape, query or
/// fragment.
fn is_plain_key(name: &str) -> bool {
    is_plain_name(name) && !name.contains(['%', '?', '#'])
}
