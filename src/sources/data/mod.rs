//! Concrete data sources.

pub mod consul;
pub mod environment;
pub mod inline;
pub mod xml_file;

use async_trait::async_trait;

use crate::aggregate::ConfigTree;
use crate::config::{DataSourceConfig, StencilConfig};
use crate::sources::{Context, DataSource, SourceResult};

pub use consul::ConsulDataSource;
pub use environment::EnvironmentDataSource;
pub use inline::InlineDataSource;
pub use xml_file::XmlFileDataSource;

/// The closed set of data source backends.
#[derive(Debug)]
pub enum DataSourceKind {
    Inline(InlineDataSource),
    Environment(EnvironmentDataSource),
    XmlFile(XmlFileDataSource),
    Consul(ConsulDataSource),
}

impl DataSourceKind {
    /// Instantiate the backend described by `source`.
    pub fn from_config(
        source: &DataSourceConfig,
        config: &StencilConfig,
        context: &Context,
    ) -> SourceResult<Self> {
        let kind = match source {
            DataSourceConfig::Inline => Self::Inline(InlineDataSource::from_config(config)),
            DataSourceConfig::Environment { prefix, lowercase } => Self::Environment(
                EnvironmentDataSource::from_vars(std::env::vars(), prefix, *lowercase),
            ),
            DataSourceConfig::XmlFile { path, var } => Self::XmlFile(XmlFileDataSource::from_config(
                path.as_deref(),
                var.as_deref(),
                config,
            )),
            DataSourceConfig::Consul { values } => Self::Consul(ConsulDataSource::new(
                &config.consul,
                values.clone(),
                context.clone(),
            )?),
        };
        Ok(kind)
    }
}

#[async_trait]
impl DataSource for DataSourceKind {
    fn name(&self) -> &str {
        match self {
            Self::Inline(s) => s.name(),
            Self::Environment(s) => s.name(),
            Self::XmlFile(s) => s.name(),
            Self::Consul(s) => s.name(),
        }
    }

    async fn global_values(&self) -> SourceResult<ConfigTree> {
        match self {
            Self::Inline(s) => s.global_values().await,
            Self::Environment(s) => s.global_values().await,
            Self::XmlFile(s) => s.global_values().await,
            Self::Consul(s) => s.global_values().await,
        }
    }

    async fn values_for_template(&self, template: &str) -> SourceResult<ConfigTree> {
        match self {
            Self::Inline(s) => s.values_for_template(template).await,
            Self::Environment(s) => s.values_for_template(template).await,
            Self::XmlFile(s) => s.values_for_template(template).await,
            Self::Consul(s) => s.values_for_template(template).await,
        }
    }
}
