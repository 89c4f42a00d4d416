//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the voice relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address, advertised URL).
    pub listener: ListenerConfig,

    /// The TTS engine requests are forwarded to.
    pub backend: BackendConfig,

    /// Path table used to compile the route table.
    pub routes: RouteConfig,

    /// Staging directory for uploaded voice samples.
    pub staging: StagingConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3001").
    pub bind_address: String,

    /// Maximum requests served at once (backpressure).
    pub max_connections: usize,

    /// Base URL advertised in upload receipts. Derived from the bind
    /// address when unset.
    pub public_base_url: Option<String>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3001".to_string(),
            max_connections: 1024,
            public_base_url: None,
        }
    }
}

impl ListenerConfig {
    /// The scheme, host and port clients should use to reach this relay,
    /// without a trailing slash.
    pub fn public_base_url(&self) -> String {
        if let Some(url) = &self.public_base_url {
            return url.trim_end_matches('/').to_string();
        }

        match self.bind_address.parse::<SocketAddr>() {
            Ok(addr) => {
                let host = match addr.ip() {
                    ip if ip.is_unspecified() => "localhost".to_string(),
                    IpAddr::V6(ip) => format!("[{}]", ip),
                    IpAddr::V4(ip) => ip.to_string(),
                };
                format!("http://{}:{}", host, addr.port())
            }
            Err(_) => format!("http://{}", self.bind_address),
        }
    }
}

/// Backend TTS engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Engine host name or IP address.
    pub host: String,

    /// Engine port.
    pub port: u16,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5002,
            connect_timeout_secs: 5,
        }
    }
}

impl BackendConfig {
    /// `host:port` form used for the outbound URI and `Host` header.
    pub fn authority(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Paths the relay answers on.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Exact paths forwarded verbatim to the TTS engine.
    pub proxy_paths: Vec<String>,

    /// Path accepting `POST` voice uploads.
    pub upload_path: String,

    /// Prefix under which staged files are served. Ends with `/`.
    pub staging_prefix: String,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            proxy_paths: vec![
                "/api/tts".to_string(),
                "/api/tts/speaker-similarity".to_string(),
                "/api/tts/info".to_string(),
                "/health".to_string(),
            ],
            upload_path: "/upload-voice".to_string(),
            staging_prefix: "/temp_voices/".to_string(),
        }
    }
}

/// Staging directory settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StagingConfig {
    /// Directory uploaded files are written to. Created on first use.
    pub directory: PathBuf,

    /// Largest accepted upload request body in bytes.
    pub max_upload_bytes: usize,

    /// Evict staged files older than this many seconds. Files are kept
    /// forever when unset.
    pub retention_secs: Option<u64>,

    /// How often the retention sweep runs, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("temp_voices"),
            max_upload_bytes: 50 * 1024 * 1024, // 50MB
            retention_secs: None,
            sweep_interval_secs: 600,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed until a response head is produced, in seconds.
    /// Synthesis is slow, so this is generous.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 300 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
