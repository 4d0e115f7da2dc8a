//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → StencilConfig (validated, immutable)
//!     → consumed once by lifecycle::startup to instantiate sources
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload path
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Source order in the file is merge order

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_config_for, parse_config, ConfigError};
pub use schema::{
    ApiConfig, ConsulConfig, ConsulValuePaths, DataSourceConfig, EnvironmentConfig, LogFormat,
    MergeStrategy, ObservabilityConfig, StencilConfig, TemplateSettings, TemplateSourceConfig,
    WorkerModel,
};
