//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the active environment exists when environments are declared
//! - Validate value ranges (timeouts > 0, connection limits > 0)
//! - Validate endpoint addresses before any source is instantiated
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: StencilConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::{DataSourceConfig, StencilConfig, TemplateSourceConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("environment must not be empty")]
    EmptyEnvironment,

    #[error("environment '{0}' is not declared under [environments]")]
    UnknownEnvironment(String),

    #[error("api.{field} must be greater than zero")]
    ZeroLimit { field: &'static str },

    #[error("consul.url '{url}' is invalid: {reason}")]
    InvalidConsulUrl { url: String, reason: String },

    #[error("template source #{index} has an empty directory path")]
    EmptyTemplatePath { index: usize },

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),

    #[error("observability.log_level '{0}' is not a log level")]
    InvalidLogLevel(String),
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &StencilConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.environment.trim().is_empty() {
        errors.push(ValidationError::EmptyEnvironment);
    } else if !config.environments.is_empty() && config.active_environment().is_none() {
        errors.push(ValidationError::UnknownEnvironment(config.environment.clone()));
    }

    if config.api.max_connections == 0 {
        errors.push(ValidationError::ZeroLimit { field: "max_connections" });
    }
    if config.api.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroLimit { field: "request_timeout_secs" });
    }

    let uses_consul = config
        .data_sources
        .iter()
        .any(|s| matches!(s, DataSourceConfig::Consul { .. }))
        || config
            .template_sources
            .iter()
            .any(|s| matches!(s, TemplateSourceConfig::Consul { .. }));
    if uses_consul {
        if let Err(reason) = check_http_url(&config.consul.url) {
            errors.push(ValidationError::InvalidConsulUrl {
                url: config.consul.url.clone(),
                reason,
            });
        }
    }

    for (index, source) in config.template_sources.iter().enumerate() {
        if let TemplateSourceConfig::Directory { path } = source {
            if path.trim().is_empty() {
                errors.push(ValidationError::EmptyTemplatePath { index });
            }
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if tracing::Level::from_str(&config.observability.log_level).is_err() {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_http_url(raw: &str) -> Result<(), String> {
    let url = url::Url::parse(raw).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("unsupported scheme '{}'", other)),
    }
}
