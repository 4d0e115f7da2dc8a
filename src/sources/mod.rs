//! Pluggable configuration backends.
//!
//! # Data Flow
//! ```text
//! StencilConfig.data_sources[]
//!     → data::DataSourceKind::from_config (instantiated once, in order)
//!     → aggregate::ConfigAggregator (global + per-template values)
//!
//! StencilConfig.template_sources[]
//!     → template::TemplateSourceKind::from_config (instantiated once)
//!     → startup: union of names feeds the aggregator
//!     → api handlers: listed and fetched on every request
//! ```
//!
//! # Design Decisions
//! - Backends are a closed enum per plugin kind, chosen at config-load time
//! - Every backend lookup path goes through `context::Context::interpolate`
//! - Backend failures are returned, never skipped; the caller decides
//!   whether they are fatal (startup) or per-connection (API)

pub mod consul;
pub mod context;
pub mod data;
pub mod template;

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::aggregate::ConfigTree;

pub use context::{Context, Environment};
pub use data::DataSourceKind;
pub use template::TemplateSourceKind;

/// Errors raised by data and template sources.
#[derive(Debug, Error)]
pub enum SourceError {
    /// A local file could not be read.
    #[error("could not read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A backing document could not be parsed.
    #[error("could not parse '{path}': {reason}")]
    Parse { path: PathBuf, reason: String },

    /// The backend could not be contacted.
    #[error("{source_name}: backend unreachable: {reason}")]
    Unreachable { source_name: String, reason: String },

    /// The backend answered with an unexpected status.
    #[error("{source_name}: backend returned status {status} for '{key}'")]
    Backend {
        source_name: String,
        key: String,
        status: u16,
    },

    /// The source was configured in a way it cannot honour.
    #[error("{source_name}: invalid configuration: {reason}")]
    InvalidConfig { source_name: String, reason: String },
}

/// Result type for source operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// A source error tagged with the identity of the source that raised it.
#[derive(Debug, Error)]
#[error("source '{source_name}' failed: {error}")]
pub struct SourceFailure {
    pub source_name: String,
    #[source]
    pub error: SourceError,
}

impl SourceFailure {
    pub fn new(source_name: impl Into<String>, error: SourceError) -> Self {
        Self {
            source_name: source_name.into(),
            error,
        }
    }
}

/// A backend contributing configuration values.
///
/// Implementations must be idempotent and must not mutate shared state:
/// the aggregator may call them in any order relative to other sources,
/// but always in configured order for the merge itself.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Identity used in logs and errors.
    fn name(&self) -> &str;

    /// Values visible to every template.
    async fn global_values(&self) -> SourceResult<ConfigTree>;

    /// Values scoped to one template in the active environment.
    async fn values_for_template(&self, template: &str) -> SourceResult<ConfigTree>;
}

/// A backend holding named template bodies.
#[async_trait]
pub trait TemplateSource: Send + Sync {
    /// Identity used in logs and errors.
    fn name(&self) -> &str;

    /// Names currently held by the backend. Never cached.
    async fn list_templates(&self) -> SourceResult<Vec<String>>;

    /// Raw body of one template, exactly as stored.
    ///
    /// Returns `Ok(None)` when this source does not hold `template`.
    async fn fetch_template(&self, template: &str) -> SourceResult<Option<String>>;
}
