//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid, limits > 0)
//! - Detect conflicting routes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use std::str::FromStr;

use axum::http::uri::Authority;
use url::Url;

use crate::config::schema::RelayConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `backend.port`.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check a loaded configuration, collecting every problem found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::new("listener.max_connections", "must be greater than 0"));
    }
    if let Some(public) = &config.listener.public_base_url {
        match Url::parse(public) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ValidationError::new(
                "listener.public_base_url",
                format!("unsupported scheme '{}'", url.scheme()),
            )),
            Err(e) => errors.push(ValidationError::new("listener.public_base_url", e.to_string())),
        }
    }

    if config.backend.host.trim().is_empty() {
        errors.push(ValidationError::new("backend.host", "must not be empty"));
    } else if Authority::from_str(&config.backend.authority()).is_err() {
        errors.push(ValidationError::new(
            "backend.host",
            format!("'{}' is not a valid host", config.backend.host),
        ));
    }
    if config.backend.port == 0 {
        errors.push(ValidationError::new("backend.port", "must be greater than 0"));
    }
    if config.backend.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("backend.connect_timeout_secs", "must be greater than 0"));
    }

    validate_routes(config, &mut errors);

    if config.staging.directory.as_os_str().is_empty() {
        errors.push(ValidationError::new("staging.directory", "must not be empty"));
    }
    if config.staging.max_upload_bytes == 0 {
        errors.push(ValidationError::new("staging.max_upload_bytes", "must be greater than 0"));
    }
    if config.staging.retention_secs == Some(0) {
        errors.push(ValidationError::new("staging.retention_secs", "must be greater than 0 when set"));
    }
    if config.staging.sweep_interval_secs == 0 {
        errors.push(ValidationError::new("staging.sweep_interval_secs", "must be greater than 0"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_routes(config: &RelayConfig, errors: &mut Vec<ValidationError>) {
    let routes = &config.routes;

    if routes.proxy_paths.is_empty() {
        errors.push(ValidationError::new("routes.proxy_paths", "at least one path is required"));
    }
    let mut seen = HashSet::new();
    for path in &routes.proxy_paths {
        if !path.starts_with('/') {
            errors.push(ValidationError::new(
                "routes.proxy_paths",
                format!("'{}' must start with '/'", path),
            ));
        }
        if !seen.insert(path.as_str()) {
            errors.push(ValidationError::new(
                "routes.proxy_paths",
                format!("'{}' is listed twice", path),
            ));
        }
        if *path == routes.upload_path {
            errors.push(ValidationError::new(
                "routes.proxy_paths",
                format!("'{}' collides with the upload path", path),
            ));
        }
        if path.starts_with(&routes.staging_prefix) {
            errors.push(ValidationError::new(
                "routes.proxy_paths",
                format!("'{}' lies under the staging prefix", path),
            ));
        }
    }

    if !routes.upload_path.starts_with('/') {
        errors.push(ValidationError::new("routes.upload_path", "must start with '/'"));
    }
    if !routes.staging_prefix.starts_with('/') || !routes.staging_prefix.ends_with('/') {
        errors.push(ValidationError::new(
            "routes.staging_prefix",
            "must start and end with '/'",
        ));
    } else if routes.staging_prefix == "/" {
        errors.push(ValidationError::new("routes.staging_prefix", "must not be the root path"));
    }
}
