//! Values written directly in the configuration file.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::aggregate::ConfigTree;
use crate::config::StencilConfig;
use crate::sources::{DataSource, SourceResult};

/// Serves `global_values` and `environments.<env>.<template>.config`.
///
/// Environment-level `global_values` override top-level ones per key.
#[derive(Debug, Clone, Default)]
pub struct InlineDataSource {
    global: ConfigTree,
    templates: BTreeMap<String, ConfigTree>,
}

impl InlineDataSource {
    pub fn new(global: ConfigTree, templates: BTreeMap<String, ConfigTree>) -> Self {
        Self { global, templates }
    }

    pub fn from_config(config: &StencilConfig) -> Self {
        let mut global = config.global_values.clone();
        let mut templates = BTreeMap::new();

        if let Some(env) = config.active_environment() {
            global.extend(env.global_values.clone());
            for (name, settings) in &env.templates {
                templates.insert(name.clone(), settings.config.clone());
            }
        }

        Self::new(global, templates)
    }
}

#[async_trait]
impl DataSource for InlineDataSource {
    fn name(&self) -> &str {
        "inline"
    }

    async fn global_values(&self) -> SourceResult<ConfigTree> {
        Ok(self.global.clone())
    }

    async fn values_for_template(&self, template: &str) -> SourceResult<ConfigTree> {
        Ok(self.templates.get(template).cloned().unwrap_or_default())
    }
}
