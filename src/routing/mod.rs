//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (route lookup)
//!     → matcher.rs (evaluate match conditions)
//!     → Return: RouteKind or NoMatch
//!
//! Route Compilation (at startup):
//!     RouteConfig
//!     → proxy paths (exact set), upload path + POST, staging prefix
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (exact and prefix matching only)
//! - Deterministic: same input always matches same route
//! - First match wins (proxy, upload, staged file)

pub mod matcher;
pub mod router;

pub use router::{RouteKind, Router};
