//! Voice relay
//!
//! Sits in front of a TTS engine on a fixed address. Browser clients talk
//! only to the relay: TTS calls are forwarded verbatim, reference voices
//! are uploaded to a staging directory and handed back as URLs the engine
//! can fetch.
//!
//! ```text
//!     Client ──▶ /api/tts, /health ... ──────────▶ TTS engine (127.0.0.1:5002)
//!            ──▶ POST /upload-voice ──▶ temp_voices/<name>
//!            ──▶ GET /temp_voices/<name> ◀───────  (engine fetches the voice)
//! ```

use std::path::PathBuf;

use clap::Parser;

use voice_relay::config::loader::{self, ConfigError};
use voice_relay::config::validation::validate_config;
use voice_relay::config::RelayConfig;
use voice_relay::lifecycle::startup;
use voice_relay::observability::logging;

#[derive(Parser, Debug)]
#[command(name = "voice-relay", version, about = "Voice-cloning reverse proxy and voice file relay")]
struct Cli {
    /// TOML config file (falls back to VOICE_RELAY_CONFIG).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:3001.
    #[arg(long)]
    bind: Option<String>,

    #[arg(long)]
    backend_host: Option<String>,

    #[arg(long)]
    backend_port: Option<u16>,

    /// Directory uploaded voices are staged in.
    #[arg(long)]
    staging_dir: Option<PathBuf>,

    /// Base URL placed in upload receipts.
    #[arg(long)]
    public_url: Option<String>,

    /// Log level when RUST_LOG is unset.
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn apply(self, config: &mut RelayConfig) {
        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if let Some(host) = self.backend_host {
            config.backend.host = host;
        }
        if let Some(port) = self.backend_port {
            config.backend.port = port;
        }
        if let Some(dir) = self.staging_dir {
            config.staging.directory = dir;
        }
        if let Some(url) = self.public_url {
            config.listener.public_base_url = Some(url);
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
    }
}

/// Defaults, then file, then environment, then flags.
fn resolve_config(mut cli: Cli) -> Result<RelayConfig, ConfigError> {
    let env = |key: &str| std::env::var(key).ok();

    let path = cli.config.take().or_else(|| loader::config_path_from_env(env));
    let mut config = match path {
        Some(path) => loader::read_config(&path)?,
        None => RelayConfig::default(),
    };
    loader::apply_env_overrides(&mut config, env)?;
    cli.apply(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(Cli::parse())?;

    logging::init_logging(&config.observability.log_level);
    tracing::info!("voice-relay v{} starting", env!("CARGO_PKG_VERSION"));

    startup::run(config).await
}
