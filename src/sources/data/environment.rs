//! Process environment variables as global values.

use async_trait::async_trait;
use serde_json::Value;

use crate::aggregate::ConfigTree;
use crate::sources::{DataSource, SourceResult};

/// Exposes every environment variable as `<prefix><name>`.
///
/// Variables are captured once at instantiation so repeated calls return
/// the same tree even if the process environment changes later.
#[derive(Debug, Clone)]
pub struct EnvironmentDataSource {
    values: ConfigTree,
}

impl EnvironmentDataSource {
    pub fn from_vars<I>(vars: I, prefix: &str, lowercase: bool) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let values = vars
            .into_iter()
            .map(|(key, value)| {
                let key = if lowercase { key.to_lowercase() } else { key };
                (format!("{}{}", prefix, key), Value::String(value))
            })
            .collect();
        Self { values }
    }
}

#[async_trait]
impl DataSource for EnvironmentDataSource {
    fn name(&self) -> &str {
        "environment"
    }

    async fn global_values(&self) -> SourceResult<ConfigTree> {
        Ok(self.values.clone())
    }

    async fn values_for_template(&self, _template: &str) -> SourceResult<ConfigTree> {
        Ok(ConfigTree::new())
    }
}
