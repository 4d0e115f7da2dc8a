//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for stencil.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::aggregate::ConfigTree;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StencilConfig {
    /// Active environment (configuration branch) for this process.
    pub environment: String,

    /// How data source contributions are combined.
    pub merge_strategy: MergeStrategy,

    /// Global values contributed by the `inline` data source.
    pub global_values: ConfigTree,

    /// Data sources in merge order (later entries win).
    pub data_sources: Vec<DataSourceConfig>,

    /// Template sources, queried in order.
    pub template_sources: Vec<TemplateSourceConfig>,

    /// Per-environment settings keyed by environment name.
    pub environments: BTreeMap<String, EnvironmentConfig>,

    /// Status API settings.
    pub api: ApiConfig,

    /// Consul connection shared by the consul-backed sources.
    pub consul: ConsulConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for StencilConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            merge_strategy: MergeStrategy::default(),
            global_values: ConfigTree::new(),
            data_sources: Vec::new(),
            template_sources: Vec::new(),
            environments: BTreeMap::new(),
            api: ApiConfig::default(),
            consul: ConsulConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl StencilConfig {
    /// Settings for the active environment, if any were configured.
    pub fn active_environment(&self) -> Option<&EnvironmentConfig> {
        self.environments.get(&self.environment)
    }
}

/// Merge behaviour for overlapping keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Last source wins per top-level key.
    #[default]
    Shallow,
    /// Nested mappings are merged recursively; last source wins on leaves.
    Deep,
}

/// One configured data source. Array order is merge order.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataSourceConfig {
    /// Values written directly in this configuration file.
    Inline,

    /// Process environment variables.
    Environment {
        #[serde(default = "default_env_prefix")]
        prefix: String,
        #[serde(default = "default_true")]
        lowercase: bool,
    },

    /// An XML document exposed under a single variable.
    XmlFile {
        #[serde(default)]
        path: Option<PathBuf>,
        #[serde(default)]
        var: Option<String>,
    },

    /// Keys stored in the Consul KV store.
    Consul {
        #[serde(default)]
        values: ConsulValuePaths,
    },
}

/// One configured template source.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TemplateSourceConfig {
    /// Files in a local directory.
    Directory { path: String },

    /// Keys under a Consul KV namespace.
    Consul {
        #[serde(default = "default_consul_templates")]
        templates: String,
    },
}

/// Settings for one environment.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Global values that override the top-level `global_values`.
    pub global_values: ConfigTree,

    /// Per-template settings keyed by template name.
    #[serde(flatten)]
    pub templates: BTreeMap<String, TemplateSettings>,
}

/// Per-template settings within an environment.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TemplateSettings {
    /// Values contributed by the `inline` data source.
    pub config: ConfigTree,

    /// XML document read by the `xml_file` data source for this template.
    pub xml_file_path: Option<PathBuf>,

    /// Variable the XML document is exposed under.
    pub xml_file_var: Option<String>,
}

/// How the server schedules accepted connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerModel {
    /// One task per accepted connection, bounded by `max_connections`.
    #[default]
    PerConnection,
    /// Each connection is fully handled before the next accept.
    /// A slow client stalls every other consumer.
    Serial,
}

/// Status API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Serve the status API after startup.
    pub enabled: bool,

    /// Address to bind (without port).
    pub bind_address: String,

    /// TCP port.
    pub port: u16,

    /// Connection scheduling model.
    pub worker_model: WorkerModel,

    /// Maximum concurrent connections (per-connection model only).
    pub max_connections: usize,

    /// Upper bound on the time spent servicing one connection.
    pub request_timeout_secs: u64,

    /// How long shutdown waits for in-flight connections.
    pub drain_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "0.0.0.0".to_string(),
            port: 6275,
            worker_model: WorkerModel::default(),
            max_connections: 1_024,
            request_timeout_secs: 30,
            drain_timeout_secs: 5,
        }
    }
}

impl ApiConfig {
    /// `bind_address:port`, ready for `TcpListener::bind`.
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Consul agent connection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConsulConfig {
    /// Agent HTTP address.
    pub url: String,

    /// Datacenter to query; substituted for `%d` in paths.
    pub dc: Option<String>,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ConsulConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8500".to_string(),
            dc: None,
            timeout_secs: 5,
        }
    }
}

/// KV paths read by the consul data source.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConsulValuePaths {
    /// Path holding global values.
    pub global: String,

    /// Path holding per-template values; `%t` is the template name.
    pub template: String,
}

impl Default for ConsulValuePaths {
    fn default() -> Self {
        Self {
            global: "stencil/globals/all".to_string(),
            template: "stencil/values/%e/%t".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

fn default_env_prefix() -> String {
    "env_".to_string()
}

fn default_true() -> bool {
    true
}

fn default_consul_templates() -> String {
    "stencil/templates/%e".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: StencilConfig = toml::from_str("").unwrap();
        assert_eq!(config.environment, "development");
        assert_eq!(config.merge_strategy, MergeStrategy::Shallow);
        assert_eq!(config.api.port, 6275);
        assert_eq!(config.api.worker_model, WorkerModel::PerConnection);
        assert!(config.data_sources.is_empty());
    }

    #[test]
    fn parses_sources_in_order() {
        let config: StencilConfig = toml::from_str(
            r#"
            environment = "production"

            [[data_sources]]
            kind = "inline"

            [[data_sources]]
            kind = "xml_file"
            path = "/etc/app.xml"
            var = "app"

            [[data_sources]]
            kind = "environment"

            [[template_sources]]
            kind = "directory"
            path = "templates/%e"

            [[template_sources]]
            kind = "consul"
            "#,
        )
        .unwrap();

        assert_eq!(config.data_sources.len(), 3);
        assert_eq!(config.data_sources[0], DataSourceConfig::Inline);
        assert_eq!(
            config.data_sources[1],
            DataSourceConfig::XmlFile {
                path: Some(PathBuf::from("/etc/app.xml")),
                var: Some("app".to_string()),
            }
        );
        assert_eq!(
            config.data_sources[2],
            DataSourceConfig::Environment {
                prefix: "env_".to_string(),
                lowercase: true,
            }
        );
        assert_eq!(
            config.template_sources[1],
            TemplateSourceConfig::Consul {
                templates: "stencil/templates/%e".to_string(),
            }
        );
    }

    #[test]
    fn parses_environment_template_settings() {
        let config: StencilConfig = toml::from_str(
            r#"
            environment = "staging"

            [environments.staging.global_values]
            region = "eu"

            [environments.staging."db.conf"]
            xml_file_path = "db.xml"
            xml_file_var = "db"

            [environments.staging."db.conf".config]
            host = "db.internal"
            port = 5432
            "#,
        )
        .unwrap();

        let env = config.active_environment().unwrap();
        assert_eq!(env.global_values["region"], "eu");
        let db = &env.templates["db.conf"];
        assert_eq!(db.config["port"], 5432);
        assert_eq!(db.xml_file_var.as_deref(), Some("db"));
    }
}
