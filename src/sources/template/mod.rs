//! Concrete template sources.

pub mod consul;
pub mod directory;

use std::path::Path;

use async_trait::async_trait;

use crate::config::{StencilConfig, TemplateSourceConfig};
use crate::sources::{Context, SourceFailure, SourceResult, TemplateSource};

pub use consul::ConsulTemplateSource;
pub use directory::DirectoryTemplateSource;

/// The closed set of template source backends.
#[derive(Debug)]
pub enum TemplateSourceKind {
    Directory(DirectoryTemplateSource),
    Consul(ConsulTemplateSource),
}

impl TemplateSourceKind {
    /// Instantiate the backend described by `source`.
    pub fn from_config(
        source: &TemplateSourceConfig,
        config: &StencilConfig,
        context: &Context,
    ) -> SourceResult<Self> {
        let kind = match source {
            TemplateSourceConfig::Directory { path } => {
                Self::Directory(DirectoryTemplateSource::new(path.clone(), context.clone()))
            }
            TemplateSourceConfig::Consul { templates } => Self::Consul(ConsulTemplateSource::new(
                &config.consul,
                templates.clone(),
                context.clone(),
            )?),
        };
        Ok(kind)
    }
}

#[async_trait]
impl TemplateSource for TemplateSourceKind {
    fn name(&self) -> &str {
        match self {
            Self::Directory(s) => s.name(),
            Self::Consul(s) => s.name(),
        }
    }

    async fn list_templates(&self) -> SourceResult<Vec<String>> {
        let names = match self {
            Self::Directory(s) => s.list_templates().await?,
            Self::Consul(s) => s.list_templates().await?,
        };
        if names.is_empty() {
            tracing::warn!(source = self.name(), "No templates could be fetched");
        }
        Ok(names)
    }

    async fn fetch_template(&self, template: &str) -> SourceResult<Option<String>> {
        match self {
            Self::Directory(s) => s.fetch_template(template).await,
            Self::Consul(s) => s.fetch_template(template).await,
        }
    }
}

/// Union of every source's listing, in first-seen order without duplicates.
pub async fn list_all<S: TemplateSource>(sources: &[S]) -> Result<Vec<String>, SourceFailure> {
    let mut names: Vec<String> = Vec::new();
    for source in sources {
        let listed = source
            .list_templates()
            .await
            .map_err(|e| SourceFailure::new(source.name(), e))?;
        for name in listed {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    Ok(names)
}

/// First body found for `template`, asking sources in configured order.
pub async fn fetch_first<S: TemplateSource>(
    sources: &[S],
    template: &str,
) -> Result<Option<String>, SourceFailure> {
    for source in sources {
        let body = source
            .fetch_template(template)
            .await
            .map_err(|e| SourceFailure::new(source.name(), e))?;
        if let Some(body) = body {
            return Ok(Some(body));
        }
    }
    Ok(None)
}

/// A single, non-traversing path component.
pub(crate) fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && Path::new(name).file_name().is_some()
}
