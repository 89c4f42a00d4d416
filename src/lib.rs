//! Voice relay library.
//!
//! A reverse proxy in front of a TTS engine that also stages uploaded
//! reference voices and serves them back by URL.

// Core subsystems
pub mod config;
pub mod error;
pub mod http;
pub mod routing;

// Request handling
pub mod proxy;
pub mod staging;
pub mod upload;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::RelayConfig;
pub use error::RelayError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
