//! Reverse proxy to the TTS engine.
//!
//! # Data Flow
//! ```text
//! Request on a proxied path
//!     → forwarder.rs (rewrite URI + Host, stream body out)
//!     → TTS engine
//!     → forwarder.rs (status, headers, streamed body back)
//! ```

pub mod forwarder;

pub use forwarder::{BackendAddressError, ProxyForwarder};
