//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// File names looked up in the app root, first match wins.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["tails.toml", "config.toml"];

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
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
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Find the config file of an app, if it has one.
pub fn find_config_file(app_root: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| app_root.join(name))
        .find(|p| p.is_file())
}

/// Load the app's config file, or defaults when the app has none.
pub fn load_app_config(app_root: &Path) -> Result<AppConfig, ConfigError> {
    match find_config_file(app_root) {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading configuration");
            load_config(&path)
        }
        None => {
            tracing::info!(app_root = %app_root.display(), "No config file found, using defaults");
            Ok(AppConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_app_config(dir.path()).unwrap();
        assert_eq!(config.listener.port, 8080);
    }

    #[test]
    fn test_tails_toml_preferred_over_config_toml() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.toml"), "[listener]\nport = 4000\n").unwrap();
        fs::write(dir.path().join("tails.toml"), "[listener]\nport = 5000\n").unwrap();

        let config = load_app_config(dir.path()).unwrap();
        assert_eq!(config.listener.port, 5000);
    }

    #[test]
    fn test_invalid_config_reports_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tails.toml");
        fs::write(&path, "[dispatch]\napi_prefix = \"api\"\n").unwrap();

        match load_config(&path) {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 1),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tails.toml");
        fs::write(&path, "[listener\n").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Parse(_))));
    }
}
