//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → loader.rs (optional TOML file, then VOICE_RELAY_* overrides)
//!     → CLI flags (main.rs)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → handed to HttpServer at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use schema::RelayConfig;
pub use schema::ListenerConfig;
pub use schema::BackendConfig;
pub use schema::RouteConfig;
pub use schema::StagingConfig;
pub use schema::ObservabilityConfig;
