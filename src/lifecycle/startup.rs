//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the lookup context from the validated configuration
//! - Instantiate every data and template source once, in configured order
//! - List templates once and build the immutable snapshot
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Sources initialize in order, not concurrently
//! - Listeners start last (traffic only when the snapshot exists)

use std::sync::Arc;

use thiserror::Error;

use crate::aggregate::{ConfigAggregator, ResolvedConfig};
use crate::config::{DataSourceConfig, StencilConfig, TemplateSourceConfig};
use crate::sources::template::list_all;
use crate::sources::{Context, DataSourceKind, Environment, SourceError, SourceFailure, TemplateSourceKind};

/// A failure that prevents the process from serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("could not instantiate {source_name}: {source}")]
    Instantiate {
        source_name: String,
        #[source]
        source: SourceError,
    },

    #[error("could not list templates: {0}")]
    ListTemplates(#[source] SourceFailure),

    #[error("could not aggregate configuration: {0}")]
    Aggregate(#[source] SourceFailure),
}

/// Everything the API needs, built once.
#[derive(Debug)]
pub struct Bootstrapped {
    pub context: Context,
    pub snapshot: Arc<ResolvedConfig>,
    pub templates: Arc<[TemplateSourceKind]>,
}

/// Instantiate sources and aggregate the snapshot.
pub async fn bootstrap(config: &StencilConfig) -> Result<Bootstrapped, StartupError> {
    let context = Context::new(Environment::new(config.environment.clone()), config.consul.dc.clone());
    tracing::info!(
        environment = %context.environment(),
        datacenter = context.datacenter().unwrap_or("-"),
        data_sources = config.data_sources.len(),
        template_sources = config.template_sources.len(),
        "Bootstrapping"
    );

    let mut data_sources = Vec::with_capacity(config.data_sources.len());
    for (index, source) in config.data_sources.iter().enumerate() {
        let kind = DataSourceKind::from_config(source, config, &context).map_err(|source_err| {
            StartupError::Instantiate {
                source_name: format!("data_sources[{}] ({})", index, data_kind(source)),
                source: source_err,
            }
        })?;
        data_sources.push(kind);
    }

    let mut template_sources = Vec::with_capacity(config.template_sources.len());
    for (index, source) in config.template_sources.iter().enumerate() {
        let kind = TemplateSourceKind::from_config(source, config, &context).map_err(|source_err| {
            StartupError::Instantiate {
                source_name: format!("template_sources[{}] ({})", index, template_kind(source)),
                source: source_err,
            }
        })?;
        template_sources.push(kind);
    }

    let names = list_all(&template_sources[..]).await.map_err(StartupError::ListTemplates)?;
    tracing::debug!(templates = ?names, "Templates discovered");

    let aggregator = ConfigAggregator::new(data_sources, config.merge_strategy);
    let snapshot = aggregator
        .build_snapshot(&names)
        .await
        .map_err(StartupError::Aggregate)?;

    tracing::info!(
        global_keys = snapshot.global_config().len(),
        templates = names.len(),
        "Configuration aggregated"
    );

    Ok(Bootstrapped {
        context,
        snapshot: Arc::new(snapshot),
        templates: template_sources.into(),
    })
}

fn data_kind(source: &DataSourceConfig) -> &'static str {
    match source {
        DataSourceConfig::Inline => "inline",
        DataSourceConfig::Environment { .. } => "environment",
        DataSourceConfig::XmlFile { .. } => "xml_file",
        DataSourceConfig::Consul { .. } => "consul",
    }
}

fn template_kind(source: &TemplateSourceConfig) -> &'static str {
    match source {
        TemplateSourceConfig::Directory { .. } => "directory",
        TemplateSourceConfig::Consul { .. } => "consul",
    }
}
