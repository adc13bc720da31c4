//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variables that override file settings.
pub const ENV_COMPANY_RUT: &str = "COMPANY_RUT";
pub const ENV_PYMO_HOST: &str = "PYMO_HOST";
pub const ENV_PYMO_PORT: &str = "PYMO_PORT";
pub const ENV_PYMO_VERSION: &str = "PYMO_VERSION";
pub const ENV_PYMO_USER: &str = "PYMO_USER";
pub const ENV_PYMO_PASSWORD: &str = "PYMO_PASSWORD";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidEnv { key: &'static str, value: String },

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

/// Load configuration: defaults, then the optional TOML file, then
/// environment overrides, then validation.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let config = match path {
        Some(path) => parse_file(path)?,
        None => GatewayConfig::default(),
    };

    let config = apply_env_overrides(config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn parse_file(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GatewayConfig = toml::from_str(&content)?;
    tracing::debug!(path = %path.display(), "Configuration file parsed");
    Ok(config)
}

/// Overlay environment values onto `config`. `lookup` abstracts the
/// environment so tests do not have to mutate process state.
pub fn apply_env_overrides<F>(mut config: GatewayConfig, lookup: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(rut) = lookup(ENV_COMPANY_RUT) {
        config.company.rut = rut;
    }
    if let Some(host) = lookup(ENV_PYMO_HOST) {
        config.upstream.host = host;
    }
    if let Some(port) = lookup(ENV_PYMO_PORT) {
        config.upstream.port = port
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidEnv { key: ENV_PYMO_PORT, value: port })?;
    }
    if let Some(version) = lookup(ENV_PYMO_VERSION) {
        config.upstream.version = version;
    }
    if let Some(user) = lookup(ENV_PYMO_USER) {
        config.upstream.user = user;
    }
    if let Some(password) = lookup(ENV_PYMO_PASSWORD) {
        config.upstream.password = password;
    }

    Ok(config)
}
