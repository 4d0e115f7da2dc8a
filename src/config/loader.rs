//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::StencilConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<StencilConfig, ConfigError> {
    load_config_for(path, None)
}

/// Load configuration, switch to `environment` when given, then validate.
///
/// Validation runs after the override so an environment declared only under
/// `[environments]` can be selected without a top-level `environment` key.
pub fn load_config_for(path: &Path, environment: Option<&str>) -> Result<StencilConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config = deserialize(&content, path)?;
    if let Some(environment) = environment {
        config.environment = environment.to_string();
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<StencilConfig, ConfigError> {
    let config = deserialize(content, Path::new(""))?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn deserialize(content: &str, path: &Path) -> Result<StencilConfig, ConfigError> {
    toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "environment = \"qa\"\n[api]\nport = 7000").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.environment, "qa");
        assert_eq!(config.api.port, 7000);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn syntax_error_names_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "environment = ").unwrap();

        match load_config(file.path()).unwrap_err() {
            ConfigError::Parse { path, .. } => assert_eq!(path, file.path()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn environment_override_is_applied_before_validation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[environments.production.global_values]\nregion = \"eu\"").unwrap();

        assert!(matches!(
            load_config(file.path()).unwrap_err(),
            ConfigError::Validation(_)
        ));

        let config = load_config_for(file.path(), Some("production")).unwrap();
        assert_eq!(config.environment, "production");
        assert!(config.active_environment().is_some());
    }

    #[test]
    fn unknown_environment_override_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[environments.production.global_values]\nregion = \"eu\"").unwrap();

        match load_config_for(file.path(), Some("staging")).unwrap_err() {
            ConfigError::Validation(errors) => assert_eq!(
                errors,
                vec![ValidationError::UnknownEnvironment("staging".to_string())]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_source_kind_is_rejected() {
        let err = parse_config("[[data_sources]]\nkind = \"redis\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
