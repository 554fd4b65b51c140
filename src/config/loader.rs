//! Configuration loading from disk and the environment.

use std::path::Path;
use std::fs;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: GatewayConfig = toml::from_str(&content)?;
    apply_env_overrides(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build a default configuration with environment overrides applied.
pub fn default_config() -> Result<GatewayConfig, ConfigError> {
    let mut config = GatewayConfig::default();
    apply_env_overrides(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply the environment-variable settings layer.
///
/// Recognized variables: `WAF_LISTEN`, `WAF_PROXY_MAP`, `WAF_AUDIT_LOG`,
/// `WAF_PROXY_TIMEOUT_SECS`, `WAF_DEBUG`. Unparseable values are ignored in
/// favor of the configured ones.
pub fn apply_env_overrides(config: &mut GatewayConfig) {
    if let Ok(listen) = std::env::var("WAF_LISTEN") {
        if !listen.is_empty() {
            config.listener.bind_address = listen;
        }
    }
    if let Ok(map_path) = std::env::var("WAF_PROXY_MAP") {
        if !map_path.is_empty() {
            config.proxy.map_path = map_path;
        }
    }
    if let Ok(log_path) = std::env::var("WAF_AUDIT_LOG") {
        if !log_path.is_empty() {
            config.audit.log_path = log_path;
        }
    }
    if let Ok(timeout) = std::env::var("WAF_PROXY_TIMEOUT_SECS") {
        if let Ok(secs) = timeout.parse::<u64>() {
            config.proxy.timeout_secs = secs;
        }
    }
    if let Ok(debug) = std::env::var("WAF_DEBUG") {
        if matches!(debug.as_str(), "1" | "true" | "yes") {
            config.observability.log_level = "debug".to_string();
        }
    }
}
