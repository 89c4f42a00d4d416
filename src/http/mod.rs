//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (add request ID, tracing span)
//!     → response.rs (CORS preflight short-circuit)
//!     → server.rs dispatch → routing → proxy | upload | staging relay
//!     → response.rs (CORS headers, slot release)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
