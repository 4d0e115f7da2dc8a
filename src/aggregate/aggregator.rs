//! Ordered aggregation of data sources into a `ResolvedConfig`.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::aggregate::{merge_into, ConfigTree};
use crate::config::MergeStrategy;
use crate::sources::{DataSource, DataSourceKind, SourceFailure};

/// The merged snapshot. Built once, read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedConfig {
    global: ConfigTree,
    per_template: BTreeMap<String, ConfigTree>,
}

impl ResolvedConfig {
    pub fn new(global: ConfigTree, per_template: BTreeMap<String, ConfigTree>) -> Self {
        Self {
            global,
            per_template,
        }
    }

    /// The merged global values.
    pub fn global_config(&self) -> &ConfigTree {
        &self.global
    }

    /// Merged values for `template`; empty for names the snapshot does not know.
    pub fn template_config(&self, template: &str) -> Cow<'_, ConfigTree> {
        match self.per_template.get(template) {
            Some(tree) => Cow::Borrowed(tree),
            None => Cow::Owned(ConfigTree::new()),
        }
    }

    /// Template names the snapshot was built for.
    pub fn template_names(&self) -> impl Iterator<Item = &str> {
        self.per_template.keys().map(String::as_str)
    }
}

/// Merges data sources in their configured order.
#[derive(Debug)]
pub struct ConfigAggregator<S = DataSourceKind> {
    sources: Vec<S>,
    strategy: MergeStrategy,
}

impl<S: DataSource> ConfigAggregator<S> {
    pub fn new(sources: Vec<S>, strategy: MergeStrategy) -> Self {
        Self { sources, strategy }
    }

    /// Configured sources, in merge order.
    pub fn sources(&self) -> &[S] {
        &self.sources
    }

    /// Query every source, in order, and merge the results.
    ///
    /// The first failing source aborts the build.
    pub async fn build_snapshot(&self, template_names: &[String]) -> Result<ResolvedConfig, SourceFailure> {
        let mut global = ConfigTree::new();
        for source in &self.sources {
            let values = source
                .global_values()
                .await
                .map_err(|e| SourceFailure::new(source.name(), e))?;
            self.merge(&mut global, values, source.name(), None);
        }

        let mut per_template = BTreeMap::new();
        for template in template_names {
            let mut tree = ConfigTree::new();
            for source in &self.sources {
                let values = source
                    .values_for_template(template)
                    .await
                    .map_err(|e| SourceFailure::new(source.name(), e))?;
                self.merge(&mut tree, values, source.name(), Some(template));
            }
            per_template.insert(template.clone(), tree);
        }

        tracing::info!(
            sources = self.sources.len(),
            global_keys = global.len(),
            templates = per_template.len(),
            "Configuration snapshot built"
        );
        Ok(ResolvedConfig::new(global, per_template))
    }

    fn merge(&self, base: &mut ConfigTree, overlay: ConfigTree, source: &str, template: Option<&str>) {
        merge_into(base, overlay, self.strategy, |key| {
            tracing::debug!(key = %key, source = %source, template = ?template, "Value overridden by later source");
        });
    }
}
