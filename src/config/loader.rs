//! Configuration loading from disk and the environment.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::RelayConfig;
use crate::config::validation::ValidationError;

/// Environment variable naming a TOML config file.
pub const ENV_CONFIG: &str = "VOICE_RELAY_CONFIG";
pub const ENV_BIND: &str = "VOICE_RELAY_BIND";
pub const ENV_BACKEND_HOST: &str = "VOICE_RELAY_BACKEND_HOST";
pub const ENV_BACKEND_PORT: &str = "VOICE_RELAY_BACKEND_PORT";
pub const ENV_PUBLIC_URL: &str = "VOICE_RELAY_PUBLIC_URL";
pub const ENV_STAGING_DIR: &str = "VOICE_RELAY_STAGING_DIR";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, message: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, message } => write!(f, "Invalid {}: {}", var, message),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Read a TOML file without validating it.
pub fn read_config(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// The config file named by the environment, if any.
pub fn config_path_from_env(lookup: impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    lookup(ENV_CONFIG).filter(|v| !v.is_empty()).map(PathBuf::from)
}

/// Overlay `VOICE_RELAY_*` variables on top of a loaded configuration.
///
/// `lookup` is usually `|k| std::env::var(k).ok()`.
pub fn apply_env_overrides(
    config: &mut RelayConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(bind) = lookup(ENV_BIND) {
        config.listener.bind_address = bind;
    }
    if let Some(host) = lookup(ENV_BACKEND_HOST) {
        config.backend.host = host;
    }
    if let Some(port) = lookup(ENV_BACKEND_PORT) {
        config.backend.port = port.trim().parse().map_err(|e: std::num::ParseIntError| {
            ConfigError::Env {
                var: ENV_BACKEND_PORT,
                message: e.to_string(),
            }
        })?;
    }
    if let Some(url) = lookup(ENV_PUBLIC_URL) {
        config.listener.public_base_url = Some(url);
    }
    if let Some(dir) = lookup(ENV_STAGING_DIR) {
        config.staging.directory = PathBuf::from(dir);
    }
    Ok(())
}
